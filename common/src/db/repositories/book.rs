// Book repository implementation

use crate::db::{DbPool, BOOKS_SCHEMA};
use crate::errors::DatabaseError;
use crate::models::{Book, BookPayload};
use async_trait::async_trait;
use tracing::instrument;

/// Storage operations for book records
///
/// Handlers depend on this trait rather than on PostgreSQL directly.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, ordered by title
    async fn find_all(&self) -> Result<Vec<Book>, DatabaseError>;

    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, DatabaseError>;

    /// Insert a new book
    ///
    /// Returns `DatabaseError::DuplicateKey` when the ISBN already exists.
    async fn create(&self, book: &Book) -> Result<Book, DatabaseError>;

    /// Replace every mutable column; `None` when no book has this ISBN
    async fn update(
        &self,
        isbn: &str,
        payload: &BookPayload,
    ) -> Result<Option<Book>, DatabaseError>;

    /// `false` when no book has this ISBN
    async fn delete(&self, isbn: &str) -> Result<bool, DatabaseError>;

    /// Remove every book, returning how many rows went away
    async fn delete_all(&self) -> Result<u64, DatabaseError>;

    /// Connectivity check behind `/health`
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// PostgreSQL-backed book store
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: DbPool,
}

impl BookRepository {
    /// Create a new BookRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the `books` table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::raw_sql(BOOKS_SCHEMA)
            .execute(self.pool.pool())
            .await?;

        tracing::debug!("Books table ensured");
        Ok(())
    }
}

#[async_trait]
impl BookStore for BookRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Book>, DatabaseError> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT isbn, amazon_url, author, language, pages, publisher, title, year
            FROM books
            ORDER BY title
            "#,
        )
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = books.len(), "Found books");
        Ok(books)
    }

    #[instrument(skip(self))]
    async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            SELECT isbn, amazon_url, author, language, pages, publisher, title, year
            FROM books
            WHERE isbn = $1
            "#,
        )
        .bind(isbn)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(book)
    }

    #[instrument(skip(self, book), fields(isbn = %book.isbn))]
    async fn create(&self, book: &Book) -> Result<Book, DatabaseError> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                isbn, amazon_url, author, language, pages, publisher, title, year
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING isbn, amazon_url, author, language, pages, publisher, title, year
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(self.pool.pool())
        .await?;

        tracing::info!(isbn = %created.isbn, title = %created.title, "Book created");
        Ok(created)
    }

    #[instrument(skip(self, payload))]
    async fn update(
        &self,
        isbn: &str,
        payload: &BookPayload,
    ) -> Result<Option<Book>, DatabaseError> {
        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET amazon_url = $2,
                author = $3,
                language = $4,
                pages = $5,
                publisher = $6,
                title = $7,
                year = $8
            WHERE isbn = $1
            RETURNING isbn, amazon_url, author, language, pages, publisher, title, year
            "#,
        )
        .bind(isbn)
        .bind(&payload.amazon_url)
        .bind(&payload.author)
        .bind(&payload.language)
        .bind(payload.pages)
        .bind(&payload.publisher)
        .bind(&payload.title)
        .bind(payload.year)
        .fetch_optional(self.pool.pool())
        .await?;

        if updated.is_some() {
            tracing::info!(isbn = %isbn, "Book updated");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, isbn: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = $1")
            .bind(isbn)
            .execute(self.pool.pool())
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(isbn = %isbn, "Book deleted");
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM books")
            .execute(self.pool.pool())
            .await?;

        tracing::info!(count = result.rows_affected(), "All books deleted");
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.pool.health_check().await
    }
}
