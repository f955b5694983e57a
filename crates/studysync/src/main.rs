//! # StudySync CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, and this file
//! only invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/studysyncapp/`: the sync core. Stores, forum hooks, badges,
//!   scoring. No terminal code.
//! - `crates/studysync/`: this CLI, depending on the library.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/studysync/src/cli/)                      │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Dispatch to the API on a tokio runtime (commands.rs)     │
//! │  - Terminal rendering with console styles (render.rs)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/studysyncapp/src/api.rs)                 │
//! │  - StudyApi: one store per record kind, forum, badges       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Testing Approach
//!
//! - **Library**: store, forum and scoring behaviour is unit tested against a
//!   scripted transport and an in-memory backend.
//! - **CLI**: argument parsing and rendering have unit tests in their modules;
//!   `tests/cli.rs` runs the built binary for commands that work offline.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
