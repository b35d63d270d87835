//! Centralized error handling for the catalog manager
//!
//! # Error Categories
//!
//! - **Not found**: entry absent for get/update/delete
//! - **Validation**: missing required fields, import without a document
//! - **Unreadable input**: malformed JSON on import
//! - **Storage / serialization**: failures writing the backing document
//!
//! # Usage
//!
//! ```rust
//! use catalog_manager::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("title is required"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
