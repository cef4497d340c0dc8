//! Token resolution: the public face of the engine.

mod model;
mod service;

pub use model::{ResolvedIdentity, ResolvedMarketData};
pub use service::Resolver;

pub(crate) use model::MarketResolution;
