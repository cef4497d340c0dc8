//! Shared HTTP plumbing for provider adapters.
//!
//! Maps transport failures and status codes onto the error taxonomy so every
//! adapter classifies them the same way.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::MarketDataError;

const USER_AGENT: &str = concat!("tokenlens/", env!("CARGO_PKG_VERSION"));

/// Client shared by an adapter. Per-request timeouts are applied on top.
pub(crate) fn build_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send `request` under `timeout` and decode a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, MarketDataError> {
    let response = request
        .timeout(timeout)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| MarketDataError::from_transport(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        debug!(provider, %status, "provider returned error status");
        return Err(MarketDataError::from_status(provider, status));
    }

    let body = response
        .text()
        .await
        .map_err(|e| MarketDataError::from_transport(provider, e))?;

    decode(provider, &body)
}

/// Decode a JSON body; an unreadable body is a transient provider error.
pub(crate) fn decode<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, MarketDataError> {
    serde_json::from_str(body).map_err(|e| MarketDataError::ProviderError {
        provider: provider.to_string(),
        message: format!("Failed to parse response: {}", e),
    })
}

/// Parse a numeric field some APIs send as a string.
pub(crate) fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}
