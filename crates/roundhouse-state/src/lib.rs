//! Pipeline checkpoint persistence for the roundhouse engine.
//!
//! Provides the [`CheckpointStore`] trait, a [`FileCheckpointStore`] that
//! keeps `metadata.json` in the pipeline data directory, and an in-memory
//! [`MemoryCheckpointStore`] for tests and embedding.

#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::CheckpointStore;
pub use error::StateError;
pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
