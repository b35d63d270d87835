//! Record store for the catalog
//!
//! The whole collection lives in one JSON document. The [`EntryStore`] trait keeps
//! the service layer independent of where that document lives, which also lets
//! tests substitute an instrumented store.

pub mod json_file;
pub mod traits;

pub use json_file::JsonFileStore;
pub use traits::EntryStore;
