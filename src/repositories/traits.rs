//! Repository trait definitions
//!
//! The catalog is stored as one document, so the store contract is whole-collection
//! only: read everything, or replace everything.

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::Entry;

/// Whole-collection entry store
///
/// There is no locking at this level. Callers that read, modify and write back
/// are responsible for serializing those sequences.
///
/// # Examples
///
/// ```rust
/// use catalog_manager::repositories::EntryStore;
///
/// async fn count<S: EntryStore>(store: &S) -> usize {
///     store.load_all().await.len()
/// }
/// ```
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Load the full collection
    ///
    /// Never fails: a missing or unparseable backing document reads as an
    /// empty collection.
    async fn load_all(&self) -> Vec<Entry>;

    /// Replace the full collection
    ///
    /// The backing document is replaced as a whole, never patched.
    async fn save_all(&self, entries: &[Entry]) -> AppResult<()>;
}
