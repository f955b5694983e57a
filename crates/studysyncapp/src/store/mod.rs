//! # Storage Layer
//!
//! Each user-owned collection (notes, flashcard sets, quizzes) lives in a
//! [`CollectionStore`]: an ordered list of records held in memory, mirrored to
//! a single persisted blob, and reconciled with the server on every write.
//!
//! ## Server is Truth
//!
//! The server assigns identifiers and timestamps, so the local copy is only
//! ever a cache of what the server has confirmed:
//!
//! 1. **Confirm, then commit**: a write is sent first. Memory and storage change
//!    only after a success response, and only with the server's canonical record.
//! 2. **Failure is a no-op**: a rejected or unreachable request leaves the
//!    collection and its blob exactly as they were.
//! 3. **Late answers are ignored**: a response for a record that was deleted in
//!    the meantime never brings it back.
//!
//! ## Blob Format
//!
//! ```text
//! <data dir>/
//! ├── notes.json        # {"version": 1, "records": [ ... ]}
//! ├── flashcards.json
//! └── quizzes.json
//! ```
//!
//! Records keep insertion order. The blob is read once, at [`CollectionStore::open`],
//! and rewritten whole after every committed change.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one JSON file per collection, atomic writes.
//! - [`mem_backend::MemBackend`]: in-memory, for tests and throwaway sessions.

pub mod backend;
pub mod collection;
pub mod fs_backend;
pub mod mem_backend;
pub mod memory;

pub use backend::StorageBackend;
pub use collection::{CollectionStore, BLOB_VERSION};
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use memory::InMemoryStore;
