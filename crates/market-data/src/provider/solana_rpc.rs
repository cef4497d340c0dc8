//! On-chain identity via a Solana RPC node with the DAS API.
//!
//! `getAsset` returns the token's Metaplex metadata (name, symbol) and links.
//! Metadata is written by the token creator, so it is the most authoritative
//! source when present and the most likely to be NUL-padded garbage when not;
//! the chain's validator sorts that out. Identity only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::http::{build_client, send_json};
use crate::errors::MarketDataError;
use crate::models::{AddressKind, IdentityCandidate, TokenAddress, SOLANA_RPC};
use crate::provider::{ProviderCapabilities, RateLimit, TokenDataProvider};

/// JSON-RPC code some providers use for throttling.
const RPC_RATE_LIMITED: i64 = -32429;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'static str,
    method: &'static str,
    params: GetAssetParams<'a>,
}

#[derive(Debug, Serialize)]
struct GetAssetParams<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<DasAsset>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct DasAsset {
    content: Option<AssetContent>,
    token_info: Option<TokenInfo>,
}

#[derive(Debug, Deserialize)]
struct AssetContent {
    metadata: Option<AssetMetadata>,
    links: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AssetMetadata {
    name: Option<String>,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    symbol: Option<String>,
}

pub struct SolanaRpcProvider {
    client: Client,
    rpc_url: String,
}

impl SolanaRpcProvider {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            rpc_url: rpc_url.into(),
        }
    }
}

fn classify_rpc_error(error: RpcError) -> MarketDataError {
    let message = error.message.to_lowercase();
    let provider = SOLANA_RPC.to_string();
    if error.code == RPC_RATE_LIMITED || message.contains("rate limit") || message.contains("too many") {
        MarketDataError::RateLimited { provider }
    } else if message.contains("not found") {
        MarketDataError::NotFound { provider }
    } else {
        MarketDataError::ProviderError {
            provider,
            message: format!("RPC error {}: {}", error.code, error.message),
        }
    }
}

fn identity_from_response(response: RpcResponse) -> Result<IdentityCandidate, MarketDataError> {
    if let Some(error) = response.error {
        return Err(classify_rpc_error(error));
    }

    let asset = response.result.ok_or_else(|| MarketDataError::NotFound {
        provider: SOLANA_RPC.to_string(),
    })?;

    let (metadata, links) = match asset.content {
        Some(content) => (content.metadata, content.links),
        None => (None, None),
    };
    let (name, meta_symbol) = match metadata {
        Some(m) => (m.name, m.symbol),
        None => (None, None),
    };

    let symbol = meta_symbol
        .filter(|s| !s.trim_matches(char::from(0)).trim().is_empty())
        .or_else(|| asset.token_info.and_then(|t| t.symbol));

    if symbol.is_none() && name.is_none() {
        return Err(MarketDataError::NotFound {
            provider: SOLANA_RPC.to_string(),
        });
    }

    let image_url = links
        .as_ref()
        .and_then(|l| l.get("image"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(IdentityCandidate {
        symbol: symbol.unwrap_or_default(),
        name: name.unwrap_or_default(),
        image_url,
    })
}

#[async_trait]
impl TokenDataProvider for SolanaRpcProvider {
    fn id(&self) -> &'static str {
        SOLANA_RPC
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identity: true,
            market: false,
            address_kinds: &[AddressKind::Base58],
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 600,
            max_concurrency: 10,
            min_delay: Duration::from_millis(10),
        }
    }

    async fn fetch_identity(
        &self,
        address: &TokenAddress,
        timeout: Duration,
    ) -> Result<IdentityCandidate, MarketDataError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: "tokenlens",
            method: "getAsset",
            params: GetAssetParams {
                id: address.as_str(),
            },
        };
        debug!(%address, "DAS getAsset");
        let response: RpcResponse =
            send_json(SOLANA_RPC, self.client.post(&self.rpc_url).json(&body), timeout).await?;
        identity_from_response(response)
    }
}
