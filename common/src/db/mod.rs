// Database layer module
// PostgreSQL connection pool and the book repository built on top of it

pub mod pool;
pub mod repositories;

pub use pool::DbPool;

/// DDL for the `books` table, applied with `CREATE TABLE IF NOT EXISTS`
pub const BOOKS_SCHEMA: &str = include_str!("../../sql/books.sql");
