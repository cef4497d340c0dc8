//! Token data providers.
//!
//! This module contains the [`TokenDataProvider`] trait and the concrete
//! adapters: on-chain Solana RPC, DexScreener, Birdeye and Jupiter.

pub mod birdeye;
pub mod capabilities;
pub mod dexscreener;
pub(crate) mod http;
pub mod jupiter;
pub mod solana_rpc;
pub mod traits;

pub use birdeye::BirdeyeProvider;
pub use capabilities::{ProviderCapabilities, RateLimit};
pub use dexscreener::DexScreenerProvider;
pub use jupiter::JupiterProvider;
pub use solana_rpc::SolanaRpcProvider;
pub use traits::TokenDataProvider;
