//! # StudySync Architecture
//!
//! StudySync is a **local-first sync core** for a study-aid app. Users keep
//! notes, flashcard sets and quizzes on their device, mirrored to a server that
//! owns the truth, and take part in a discussion forum. The crate has no UI;
//! the `studysync` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (the studysync CLI, or any other shell)             │
//! │  - Parses input, renders notices, owns the tokio runtime    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - One StudyApi wiring stores, forum hooks and badges       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Domain Layer (store/collection.rs, forum/, scoring/)       │
//! │  - Confirm-then-commit writes, query invalidation, scoring  │
//! └─────────────────────────────────────────────────────────────┘
//!                     │                       │
//!                     ▼                       ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Storage (store/backend.rs)   │ │  Transport (transport/)   │
//! │  FsBackend, MemBackend        │ │  ReqwestTransport, Mock   │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Key Principle: The Server Decides
//!
//! Nothing becomes local state until the server has confirmed it. Identifiers,
//! timestamps and ownership all come from the server's canonical record, so a
//! collection never holds a record the server does not know about.
//!
//! ## No I/O Assumptions in Core
//!
//! Code in this crate:
//! - Never writes to stdout/stderr (it logs through `tracing` and reports
//!   through a [`notify::Notifier`])
//! - Never calls `std::process::exit`
//! - Never builds its own runtime; the caller brings tokio
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`store`]: Persisted collection stores and their storage backends
//! - [`forum`]: Forum mutation hooks and the query cache they invalidate
//! - [`badges`]: Badge catalog and the fire-and-forget evaluation trigger
//! - [`scoring`]: Quiz scoring and timer helpers
//! - [`comments`]: Lookups over nested comment threads
//! - [`transport`]: HTTP seam, reqwest implementation and a scripted mock
//! - [`model`]: Records, drafts, payloads and comments
//! - [`notify`]: User-facing notices
//! - [`config`]: Configuration loading
//! - [`error`]: Error types

pub mod api;
pub mod badges;
pub mod comments;
pub mod config;
pub mod error;
pub mod forum;
pub mod model;
pub mod notify;
pub mod scoring;
pub mod store;
pub mod transport;
