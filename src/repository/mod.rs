//! Where validation sources come from.
//!
//! The engine only ever sees logical source ids; a [`SourceRepository`] maps
//! them to text. The filesystem implementation backs the CLI, the in-memory
//! one backs tests and embedding callers.

mod in_memory;
mod source_repository;

pub use in_memory::InMemorySourceRepository;
pub use source_repository::{FileSourceRepository, SourceRepository};
