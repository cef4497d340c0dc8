//! Token address parsing.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Characters of the Bitcoin base58 alphabet used by Solana addresses.
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Number of characters kept on each side of a shortened address.
const SHORT_EDGE: usize = 4;

/// Address family of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Base58 mint address (32-44 chars).
    Base58,
    /// `0x`-prefixed 20-byte hex address.
    Evm,
}

/// Validated token address.
///
/// Construction goes through [`TokenAddress::parse`], so a value of this type
/// is never empty or malformed. EVM addresses are lower-cased so cache keys
/// are stable regardless of checksum casing.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAddress {
    value: Arc<str>,
    kind: AddressKind,
}

impl TokenAddress {
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MarketDataError::InvalidAddress("empty address".to_string()));
        }

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            if hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Ok(Self {
                    value: Arc::from(format!("0x{}", hex.to_ascii_lowercase())),
                    kind: AddressKind::Evm,
                });
            }
            return Err(MarketDataError::InvalidAddress(trimmed.to_string()));
        }

        if is_base58_address(trimmed) {
            return Ok(Self {
                value: Arc::from(trimmed),
                kind: AddressKind::Base58,
            });
        }

        Err(MarketDataError::InvalidAddress(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    /// Placeholder form `abcd...wxyz` used for degraded answers.
    pub fn shortened(&self) -> String {
        let v = self.as_str();
        format!("{}...{}", &v[..SHORT_EDGE], &v[v.len() - SHORT_EDGE..])
    }

    /// Whether the address ends with `suffix`, compared case-sensitively as
    /// mint suffixes are.
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.value.ends_with(suffix)
    }
}

/// True when `s` is 32-44 chars drawn from the base58 alphabet.
pub fn is_base58_address(s: &str) -> bool {
    (32..=44).contains(&s.len()) && s.chars().all(|c| BASE58_ALPHABET.contains(c))
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAddress({})", self.value)
    }
}

impl TryFrom<String> for TokenAddress {
    type Error = MarketDataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TokenAddress> for String {
    fn from(value: TokenAddress) -> Self {
        value.value.to_string()
    }
}

impl std::str::FromStr for TokenAddress {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    #[test]
    fn test_parse_base58() {
        let addr = TokenAddress::parse(BONK).unwrap();
        assert_eq!(addr.kind(), AddressKind::Base58);
        assert_eq!(addr.as_str(), BONK);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let addr = TokenAddress::parse(&format!("  {}\n", BONK)).unwrap();
        assert_eq!(addr.as_str(), BONK);
    }

    #[test]
    fn test_parse_evm_lowercases() {
        let addr = TokenAddress::parse("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
        assert_eq!(addr.kind(), AddressKind::Evm);
        assert_eq!(addr.as_str(), "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(TokenAddress::parse("").is_err());
        assert!(TokenAddress::parse("   ").is_err());
        assert!(TokenAddress::parse("0x1234").is_err());
        assert!(TokenAddress::parse("short").is_err());
        // '0' and 'O' are not in the base58 alphabet
        assert!(TokenAddress::parse("0OOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOOO").is_err());
    }

    #[test]
    fn test_shortened() {
        let addr = TokenAddress::parse(BONK).unwrap();
        assert_eq!(addr.shortened(), "DezX...B263");
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let addr = TokenAddress::parse(BONK).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", BONK));
        let back: TokenAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
        assert!(serde_json::from_str::<TokenAddress>("\"nope\"").is_err());
    }
}
