//! Identity validation and normalization.
//!
//! Decides whether a provider's symbol/name answer is trustworthy enough to
//! return as authoritative and persist. Rules, applied in order to each field
//! (first failure wins):
//!
//! 1. Non-empty after normalization, length within bounds
//!    (symbol `[2, 20]`, name `[2, 64]`).
//! 2. Not a placeholder from the blacklist (`Unknown`, `Token`, `pump`, ...),
//!    compared case-insensitively.
//! 3. Not a shortened address (`abcd...wxyz`) and, under 12 chars, no ellipsis.
//! 4. Not purely numeric, not an EVM hex address, not a base58 address.
//! 5. A token whose mint ends with the bonding-curve suffix may use that suffix
//!    as its symbol; it is normalized to `Pump` instead of being rejected.
//!
//! Everything here is pure and deterministic.

use std::fmt;
use std::ops::RangeInclusive;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{is_base58_address, IdentityCandidate, TokenAddress};

/// Mint suffix used by the pump.fun bonding-curve program.
pub const BONDING_CURVE_SUFFIX: &str = "pump";

/// Normalized symbol for tokens whose symbol is the bonding-curve suffix.
const BONDING_CURVE_SYMBOL: &str = "Pump";

/// Below this length a value containing an ellipsis is treated as truncated.
const ELLIPSIS_MIN_LEN: usize = 12;

/// Placeholder values providers emit when they have nothing real to say.
const BLACKLIST: &[&str] = &[
    "",
    "unknown",
    "unknown token",
    "token",
    "pump",
    "n/a",
    "na",
    "tbd",
    "null",
    "nil",
    "none",
    "undefined",
    "unnamed",
    "untitled",
    "no name",
    "?",
    "??",
    "???",
    "-",
    "--",
];

lazy_static! {
    /// `abcd...wxyz` placeholder produced by UIs and degraded answers.
    static ref SHORTENED_ADDRESS_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9]{3,4}\.\.\.[A-Za-z0-9]{3,4}$")
            .expect("Invalid regex pattern");

    /// EVM-style hex address.
    static ref EVM_ADDRESS_REGEX: Regex =
        Regex::new(r"^0[xX][0-9a-fA-F]{40}$")
            .expect("Invalid regex pattern");
}

/// Which half of the identity failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityField {
    Symbol,
    Name,
}

/// Why a value was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    TooShort,
    TooLong,
    Blacklisted,
    ShortenedAddress,
    Ellipsis,
    Numeric,
    HexAddress,
    Base58Address,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Empty => "empty",
            RejectReason::TooShort => "too short",
            RejectReason::TooLong => "too long",
            RejectReason::Blacklisted => "blacklisted",
            RejectReason::ShortenedAddress => "shortened address",
            RejectReason::Ellipsis => "ellipsis",
            RejectReason::Numeric => "numeric",
            RejectReason::HexAddress => "hex address",
            RejectReason::Base58Address => "base58 address",
        }
    }
}

/// A failed validation: the field and the first rule it broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub field: IdentityField,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            IdentityField::Symbol => "symbol",
            IdentityField::Name => "name",
        };
        write!(f, "{} {}", field, self.reason.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct IdentityValidatorConfig {
    pub symbol_len: RangeInclusive<usize>,
    pub name_len: RangeInclusive<usize>,
    /// Mint suffix whose matching symbol is normalized rather than rejected.
    pub bonding_curve_suffix: Option<&'static str>,
}

impl Default for IdentityValidatorConfig {
    fn default() -> Self {
        Self {
            symbol_len: 2..=20,
            name_len: 2..=64,
            bonding_curve_suffix: Some(BONDING_CURVE_SUFFIX),
        }
    }
}

/// Validator for identity candidates.
///
/// Stateless apart from its configuration; share it freely across tasks.
#[derive(Clone, Debug, Default)]
pub struct IdentityValidator {
    config: IdentityValidatorConfig,
}

impl IdentityValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IdentityValidatorConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw provider answer for `address`.
    pub fn normalize(&self, address: &TokenAddress, raw: &IdentityCandidate) -> IdentityCandidate {
        let image_url = raw
            .image_url
            .as_deref()
            .map(normalize_text)
            .filter(|url| !url.is_empty());

        IdentityCandidate {
            symbol: self.normalize_symbol(address, &raw.symbol),
            name: normalize_text(&raw.name),
            image_url,
        }
    }

    /// Normalize a symbol, applying the bonding-curve special case.
    pub fn normalize_symbol(&self, address: &TokenAddress, raw: &str) -> String {
        let symbol = normalize_text(raw);
        if self.is_bonding_curve_symbol(address, &symbol) {
            return BONDING_CURVE_SYMBOL.to_string();
        }
        symbol
    }

    /// Boolean form of [`check`](Self::check).
    pub fn accept(&self, address: &TokenAddress, symbol: &str, name: &str) -> bool {
        self.check(address, symbol, name).is_ok()
    }

    /// Run the rules over an already-normalized symbol and name.
    pub fn check(&self, address: &TokenAddress, symbol: &str, name: &str) -> Result<(), Rejection> {
        let symbol_exempt = self.is_bonding_curve_symbol(address, symbol);
        check_field(symbol, &self.config.symbol_len, symbol_exempt).map_err(|reason| {
            Rejection {
                field: IdentityField::Symbol,
                reason,
            }
        })?;
        check_field(name, &self.config.name_len, false).map_err(|reason| Rejection {
            field: IdentityField::Name,
            reason,
        })
    }

    pub fn check_candidate(
        &self,
        address: &TokenAddress,
        candidate: &IdentityCandidate,
    ) -> Result<(), Rejection> {
        self.check(address, &candidate.symbol, &candidate.name)
    }

    fn is_bonding_curve_symbol(&self, address: &TokenAddress, symbol: &str) -> bool {
        match self.config.bonding_curve_suffix {
            Some(suffix) => address.has_suffix(suffix) && symbol.eq_ignore_ascii_case(suffix),
            None => false,
        }
    }
}

/// Strip control and zero-width characters and collapse whitespace runs.
///
/// On-chain metadata is commonly NUL-padded, hence the control filter.
pub fn normalize_text(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_whitespace() || !(c.is_control() || is_zero_width(*c)))
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

fn check_field(
    value: &str,
    len: &RangeInclusive<usize>,
    blacklist_exempt: bool,
) -> Result<(), RejectReason> {
    let trimmed = value.trim();
    let chars = trimmed.chars().count();

    // Rule 1
    if chars == 0 {
        return Err(RejectReason::Empty);
    }
    if chars < *len.start() {
        return Err(RejectReason::TooShort);
    }
    if chars > *len.end() {
        return Err(RejectReason::TooLong);
    }

    // Rule 2
    if !blacklist_exempt {
        let lowered = trimmed.to_lowercase();
        if BLACKLIST.contains(&lowered.as_str()) {
            return Err(RejectReason::Blacklisted);
        }
    }

    // Rule 3
    if SHORTENED_ADDRESS_REGEX.is_match(trimmed) {
        return Err(RejectReason::ShortenedAddress);
    }
    if chars < ELLIPSIS_MIN_LEN && (trimmed.contains("...") || trimmed.contains('\u{2026}')) {
        return Err(RejectReason::Ellipsis);
    }

    // Rule 4
    if is_numeric(trimmed) {
        return Err(RejectReason::Numeric);
    }
    if EVM_ADDRESS_REGEX.is_match(trimmed) {
        return Err(RejectReason::HexAddress);
    }
    if is_base58_address(trimmed) {
        return Err(RejectReason::Base58Address);
    }

    Ok(())
}

fn is_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '_'))
}
