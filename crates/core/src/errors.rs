//! Core error types for token resolution.
//!
//! This module defines storage-agnostic error types. Backend-specific errors
//! (from Diesel, SQLite, Redis, etc.) are converted to these types by the layer
//! that owns the backend.

use thiserror::Error;

use tokenlens_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the resolution engine.
///
/// The public resolver operations never surface this type; it is what the
/// cache tiers, the durable store and configuration loading return internally.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Cache operation failed: {0}")]
    Cache(#[from] CacheError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Failed to serialize cached value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Storage-agnostic error type for durable store operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert backend-specific errors into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors from the shared (L2) cache tier.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Shared cache unavailable: {0}")]
    Unavailable(String),

    #[error("Shared cache command failed: {0}")]
    CommandFailed(String),

    #[error("Cached value for '{key}' could not be decoded: {message}")]
    Corrupt { key: String, message: String },
}
