//! Business logic services
//!
//! Services own the rules of the catalog (identifier assignment, merging,
//! cache invalidation, change notification) and receive every collaborator
//! through their constructor.

pub mod catalog;

pub use catalog::{next_id, CatalogService, ENTRIES_CACHE_KEY};
