//! SQLite storage for validated token identities.

mod model;
mod repository;

pub use model::TokenIdentityDB;
pub use repository::SqliteDurableStore;

// Re-export trait from core for convenience
pub use tokenlens_core::identity::DurableStore;
