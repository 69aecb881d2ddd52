// Shared library for the bookstore API: configuration, models, validation and persistence

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod telemetry;
pub mod validation;
