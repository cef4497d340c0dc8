use std::borrow::Cow;

/// Provider identifier - mostly static constants
pub type ProviderId = Cow<'static, str>;

pub const SOLANA_RPC: &str = "SOLANA_RPC";
pub const DEXSCREENER: &str = "DEXSCREENER";
pub const BIRDEYE: &str = "BIRDEYE";
pub const JUPITER: &str = "JUPITER";

/// Data class a provider chain serves.
///
/// Identity and market data are resolved through independent chains because
/// provider strength differs per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataClass {
    Identity,
    Market,
}

impl DataClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataClass::Identity => "identity",
            DataClass::Market => "market",
        }
    }
}

impl std::fmt::Display for DataClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
