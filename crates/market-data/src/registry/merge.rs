//! Per-field merge of market quotes from several providers.
//!
//! Each field falls through the chain on its own: the first provider that
//! reports a positive value wins it. An explicit zero is held as a fallback
//! and replaced if a later provider reports a positive value. A field nobody
//! reported stays `None`.

use chrono::{DateTime, Utc};

use crate::models::{FieldSources, MarketField, MarketQuote, ProviderId};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedQuote {
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub sources: FieldSources,
}

impl MergedQuote {
    pub fn get(&self, field: MarketField) -> Option<f64> {
        match field {
            MarketField::Price => self.price,
            MarketField::MarketCap => self.market_cap,
            MarketField::Volume24h => self.volume_24h,
        }
    }

    fn slot(&mut self, field: MarketField) -> &mut Option<f64> {
        match field {
            MarketField::Price => &mut self.price,
            MarketField::MarketCap => &mut self.market_cap,
            MarketField::Volume24h => &mut self.volume_24h,
        }
    }

    /// Take whatever `quote` improves. Returns true if any field changed.
    pub fn absorb(&mut self, provider: &ProviderId, quote: &MarketQuote) -> bool {
        let mut changed = false;

        for (field, incoming) in quote.fields() {
            let Some(value) = incoming else { continue };
            let slot = self.slot(field);
            let better = match *slot {
                None => true,
                Some(current) => current <= 0.0 && value > 0.0,
            };
            if better {
                *slot = Some(value);
                self.sources.set(field, provider.clone());
                changed = true;
            }
        }

        if self.created_at.is_none() && quote.created_at.is_some() {
            self.created_at = quote.created_at;
            changed = true;
        }

        changed
    }

    /// Every field holds a positive value; no later provider can improve it.
    pub fn is_complete(&self) -> bool {
        MarketField::ALL
            .iter()
            .all(|f| self.get(*f).is_some_and(|v| v > 0.0))
    }

    /// Every field was reported by someone, possibly as an explicit zero.
    pub fn is_resolved(&self) -> bool {
        MarketField::ALL.iter().all(|f| self.get(*f).is_some())
    }

    pub fn missing(&self) -> Vec<MarketField> {
        MarketField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Fill fields still missing from a previously cached value.
    pub fn fill_missing(&mut self, field: MarketField, value: f64, provider: ProviderId) {
        let slot = self.slot(field);
        if slot.is_none() {
            *slot = Some(value);
            self.sources.set(field, provider);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn q(price: Option<f64>, cap: Option<f64>, vol: Option<f64>) -> MarketQuote {
        MarketQuote {
            price,
            market_cap: cap,
            volume_24h: vol,
            created_at: None,
        }
    }

    #[test]
    fn test_fields_sourced_independently() {
        let a: ProviderId = Cow::Borrowed("A");
        let b: ProviderId = Cow::Borrowed("B");
        let mut merged = MergedQuote::default();

        assert!(merged.absorb(&a, &q(Some(1.25), Some(0.0), None)));
        assert!(!merged.is_complete());
        assert!(merged.absorb(&b, &q(Some(9.0), Some(5_000.0), Some(40.0))));

        assert_eq!(merged.price, Some(1.25));
        assert_eq!(merged.market_cap, Some(5_000.0));
        assert_eq!(merged.volume_24h, Some(40.0));
        assert_eq!(merged.sources.price.as_deref(), Some("A"));
        assert_eq!(merged.sources.market_cap.as_deref(), Some("B"));
        assert!(merged.is_complete());
    }

    #[test]
    fn test_explicit_zero_is_resolved_not_complete() {
        let a: ProviderId = Cow::Borrowed("A");
        let mut merged = MergedQuote::default();
        merged.absorb(&a, &q(Some(0.01), Some(0.0), Some(0.0)));
        assert!(merged.is_resolved());
        assert!(!merged.is_complete());
        assert!(merged.missing().is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let a: ProviderId = Cow::Borrowed("A");
        let mut merged = MergedQuote::default();
        merged.absorb(&a, &q(Some(2.0), None, None));
        assert_eq!(
            merged.missing(),
            vec![MarketField::MarketCap, MarketField::Volume24h]
        );

        merged.fill_missing(MarketField::MarketCap, 10.0, Cow::Borrowed("CACHE"));
        merged.fill_missing(MarketField::Price, 99.0, Cow::Borrowed("CACHE"));
        assert_eq!(merged.market_cap, Some(10.0));
        assert_eq!(merged.price, Some(2.0));
    }
}
