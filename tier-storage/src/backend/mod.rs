//! Storage backends

mod memory;
mod traits;

pub use memory::{InMemoryStorageBackend, JobScript};
pub use traits::StorageBackend;
