//! Durable identity records (the L3 tier).
//!
//! Only identities that passed validation are ever written here, so a record
//! read back is trusted without re-validation on the hot path. The poisoned
//! record purge re-checks stored records against the current validator rules.

mod memory;
mod model;
mod store;

pub use memory::InMemoryDurableStore;
pub use model::{IdentityPage, IdentityRecord};
pub use store::DurableStore;
