use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Book Models
// ============================================================================

/// Book represents one row of the `books` table, keyed by ISBN
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(deny_unknown_fields)]
pub struct Book {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// BookPayload carries every mutable column of a book
///
/// Used as the body of an update; the ISBN comes from the request path
/// and may not be changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookPayload {
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

impl Book {
    /// Assemble a full record from a path ISBN and an update payload
    pub fn from_payload(isbn: impl Into<String>, payload: BookPayload) -> Self {
        Self {
            isbn: isbn.into(),
            amazon_url: payload.amazon_url,
            author: payload.author,
            language: payload.language,
            pages: payload.pages,
            publisher: payload.publisher,
            title: payload.title,
            year: payload.year,
        }
    }

    /// Split a record into its key and mutable columns
    pub fn into_parts(self) -> (String, BookPayload) {
        (
            self.isbn,
            BookPayload {
                amazon_url: self.amazon_url,
                author: self.author,
                language: self.language,
                pages: self.pages,
                publisher: self.publisher,
                title: self.title,
                year: self.year,
            },
        )
    }
}
