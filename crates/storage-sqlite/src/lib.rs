//! SQLite durable store for Tokenlens.
//!
//! Implements the `DurableStore` trait from `tokenlens-core` on top of Diesel
//! with an r2d2 pool. Contains:
//! - Database connection pooling and the single-writer actor
//! - Embedded Diesel migrations
//! - The `token_identities` repository
//!
//! ```text
//! core (resolver, cache tiers)
//!          │  DurableStore
//!          ▼
//! storage-sqlite (this crate)
//!          │
//!          ▼
//!      SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod identities;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use identities::{SqliteDurableStore, TokenIdentityDB};

// Re-export from tokenlens-core for convenience
pub use tokenlens_core::errors::{DatabaseError, Error, Result};
