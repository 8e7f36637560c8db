#![forbid(unsafe_code)]

mod mapping;
pub mod progress_store;
pub mod repository;
pub mod sqlite;

pub use progress_store::{ProgressChange, ProgressStore};
pub use repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};
