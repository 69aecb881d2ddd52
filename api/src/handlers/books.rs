use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use common::errors::DatabaseError;
use common::models::Book;
use common::telemetry::{record_book_operation, Outcome};
use common::validation::{normalize_isbn, parse_book, parse_payload};

/// `{"books": [...]}`
#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

/// `{"book": {...}}`
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

/// `{"message": "..."}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn outcome_of(err: &ErrorResponse) -> Outcome {
    match err.status() {
        StatusCode::NOT_FOUND => Outcome::NotFound,
        StatusCode::BAD_REQUEST => Outcome::Invalid,
        StatusCode::CONFLICT => Outcome::Conflict,
        _ => Outcome::Error,
    }
}

fn finish<T>(
    operation: &'static str,
    started: Instant,
    result: Result<T, ErrorResponse>,
) -> Result<T, ErrorResponse> {
    let outcome = match &result {
        Ok(_) => Outcome::Success,
        Err(err) => outcome_of(err),
    };
    record_book_operation(operation, outcome, started.elapsed().as_secs_f64());
    result
}

fn book_not_found(isbn: &str) -> ErrorResponse {
    ErrorResponse::new("not_found", format!("There is no book with an isbn '{}'", isbn))
}

fn database_failure(action: &str, err: DatabaseError) -> ErrorResponse {
    match err {
        DatabaseError::DuplicateKey(_) | DatabaseError::NotFound(_) => err.into(),
        DatabaseError::ConnectionFailed(_) | DatabaseError::HealthCheckFailed(_) => {
            tracing::error!(error = %err, "Database unavailable, cannot {} book", action);
            err.into()
        }
        other => {
            tracing::error!(error = %other, "Failed to {} book", action);
            ErrorResponse::new("database_error", format!("Failed to {} book: {}", action, other))
        }
    }
}

/// List all books, ordered by title
#[tracing::instrument(skip(state))]
pub async fn list_books(State(state): State<AppState>) -> Result<Json<BooksResponse>, ErrorResponse> {
    let started = Instant::now();
    let result = async {
        let books = state
            .books
            .find_all()
            .await
            .map_err(|e| database_failure("fetch", e))?;

        tracing::debug!(count = books.len(), "Listed books");
        Ok::<_, ErrorResponse>(Json(BooksResponse { books }))
    }
    .await;
    finish("list", started, result)
}

/// Get a single book by ISBN
#[tracing::instrument(skip_all, fields(isbn = %isbn))]
pub async fn get_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, ErrorResponse> {
    let started = Instant::now();
    let isbn = normalize_isbn(&isbn);
    let result = async {
        let book = state
            .books
            .find_by_isbn(&isbn)
            .await
            .map_err(|e| database_failure("fetch", e))?
            .ok_or_else(|| book_not_found(&isbn))?;

        Ok::<_, ErrorResponse>(Json(BookResponse { book }))
    }
    .await;
    finish("get", started, result)
}

/// Create a new book from a validated body
///
/// A second book with the same ISBN is rejected with 409.
#[tracing::instrument(skip_all)]
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), ErrorResponse> {
    let started = Instant::now();
    let result = async {
        let Json(body) = payload?;
        let book = parse_book(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected book body");
            ErrorResponse::from(e)
        })?;

        let created = state
            .books
            .create(&book)
            .await
            .map_err(|e| database_failure("create", e))?;

        tracing::info!(isbn = %created.isbn, "Book created successfully");
        Ok::<_, ErrorResponse>((StatusCode::CREATED, Json(BookResponse { book: created })))
    }
    .await;
    finish("create", started, result)
}

/// Replace every mutable field of an existing book
#[tracing::instrument(skip_all, fields(isbn = %isbn))]
pub async fn update_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, ErrorResponse> {
    let started = Instant::now();
    let isbn = normalize_isbn(&isbn);
    let result = async {
        let Json(body) = payload?;
        let update = parse_payload(body).map_err(|e| {
            tracing::debug!(error = %e, "Rejected book update body");
            ErrorResponse::from(e)
        })?;

        let book = state
            .books
            .update(&isbn, &update)
            .await
            .map_err(|e| database_failure("update", e))?
            .ok_or_else(|| book_not_found(&isbn))?;

        tracing::info!(isbn = %isbn, "Book updated successfully");
        Ok::<_, ErrorResponse>(Json(BookResponse { book }))
    }
    .await;
    finish("update", started, result)
}

/// Delete a book by ISBN
#[tracing::instrument(skip_all, fields(isbn = %isbn))]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    let started = Instant::now();
    let isbn = normalize_isbn(&isbn);
    let result = async {
        let deleted = state
            .books
            .delete(&isbn)
            .await
            .map_err(|e| database_failure("delete", e))?;

        if !deleted {
            return Err(book_not_found(&isbn));
        }

        tracing::info!(isbn = %isbn, "Book deleted successfully");
        Ok::<_, ErrorResponse>(Json(MessageResponse {
            message: "Book deleted".to_string(),
        }))
    }
    .await;
    finish("delete", started, result)
}
