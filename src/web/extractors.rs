//! Request extractors
//!
//! Query parsing is forgiving: a value is read from its leading digits
//! (`2abc` is page 2), and anything that yields no positive integer falls back
//! to the default instead of rejecting the request.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Pagination parameters from query string (`?page=&limit=`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: usize,
    pub limit: usize,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PaginationParams {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        Self {
            page: positive(query.get("page")).unwrap_or(DEFAULT_PAGE),
            limit: positive(query.get("limit")).unwrap_or(DEFAULT_LIMIT),
        }
    }
}

fn positive(value: Option<&String>) -> Option<usize> {
    let value = value?.trim_start();
    let value = value.strip_prefix('+').unwrap_or(value);
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    digits.parse::<usize>().ok().filter(|v| *v > 0)
}

#[async_trait]
impl<S> FromRequestParts<S> for PaginationParams
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let query = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Query(query)| query)
            .unwrap_or_default();

        Ok(Self::from_query(&query))
    }
}

/// Parse an entry identifier from a path segment.
///
/// Anything that is not a positive integer can never match a stored entry.
pub fn parse_entry_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id > 0)
}
