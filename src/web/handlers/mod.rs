//! HTTP request handlers organized by domain
//!
//! Handlers stay thin: they translate HTTP into service calls and service
//! results back into the standard response envelope.

pub mod entries;
pub mod health;
pub mod notifications;
