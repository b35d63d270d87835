//! Catalog entry and its request payloads

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// One catalog record as persisted and served
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
}

/// Validated entry fields awaiting an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
}

impl NewEntry {
    pub fn into_entry(self, id: u64) -> Entry {
        Entry {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            genre: self.genre,
        }
    }
}

/// Body of a create request, also the shape of one imported item.
///
/// Fields are optional here so that a missing field surfaces as a validation
/// error naming that field. Any `id` the client sends is dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryCreateRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl EntryCreateRequest {
    pub fn validate(self) -> AppResult<NewEntry> {
        Ok(NewEntry {
            title: required_text("title", self.title)?,
            author: required_text("author", self.author)?,
            year: self
                .year
                .ok_or_else(|| AppError::validation("year is required"))?,
            genre: required_text("genre", self.genre)?,
        })
    }
}

/// Body of an update request; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryUpdateRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl EntryUpdateRequest {
    /// Shallow merge over `entry`. Validates everything before touching it.
    pub fn apply_to(self, entry: &mut Entry) -> AppResult<()> {
        let title = optional_text("title", self.title)?;
        let author = optional_text("author", self.author)?;
        let genre = optional_text("genre", self.genre)?;

        if let Some(title) = title {
            entry.title = title;
        }
        if let Some(author) = author {
            entry.author = author;
        }
        if let Some(year) = self.year {
            entry.year = year;
        }
        if let Some(genre) = genre {
            entry.genre = genre;
        }
        Ok(())
    }
}

fn required_text(field: &str, value: Option<String>) -> AppResult<String> {
    optional_text(field, value)?.ok_or_else(|| AppError::validation(format!("{field} is required")))
}

fn optional_text(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Err(AppError::validation(format!("{field} must not be empty")))
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}
