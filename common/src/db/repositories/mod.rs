// Repository layer for database operations

pub mod book;

pub use book::{BookRepository, BookStore};
