//! Whole-collection persistence for bookshelf.
//!
//! A [`CollectionStore`] reads and replaces an entire collection on every
//! call. There is no locking across a load/save pair: two writers that both
//! load before either saves will lose one update.

pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Storage port for a collection of records that is always read and written whole.
#[async_trait]
pub trait CollectionStore<T>: Send + Sync {
    /// Read the full collection.
    async fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Replace the full collection.
    async fn save(&self, items: &[T]) -> Result<(), StoreError>;
}
