//! Negative cache of addresses whose resolution was explicitly rejected.
//!
//! A mark short-circuits resolution for its time-to-live: no cache tier or
//! provider is consulted and the degraded value is returned. Only explicit
//! rejections mark an address; timeouts and outages never do.

use std::time::Duration;

use dashmap::DashMap;
use log::debug;
use tokio::time::Instant;

use tokenlens_market_data::TokenAddress;

#[derive(Debug)]
pub struct FailureTracker {
    name: &'static str,
    marks: DashMap<TokenAddress, Instant>,
    ttl: Duration,
}

impl FailureTracker {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            marks: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn mark_failed(&self, address: &TokenAddress) {
        debug!("{} failure mark set for {} ({}s)", self.name, address, self.ttl.as_secs());
        self.marks.insert(address.clone(), Instant::now() + self.ttl);
    }

    /// True while an unexpired mark exists.
    pub fn is_failed(&self, address: &TokenAddress) -> bool {
        self.marks
            .get(address)
            .is_some_and(|expires_at| Instant::now() < *expires_at)
    }

    pub fn clear(&self, address: &TokenAddress) {
        self.marks.remove(address);
    }

    /// Drops expired marks. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.marks.len();
        self.marks.retain(|_, expires_at| now < *expires_at);
        before.saturating_sub(self.marks.len())
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> TokenAddress {
        TokenAddress::parse("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_expires_after_ttl() {
        let tracker = FailureTracker::new("identity", Duration::from_secs(300));
        tracker.mark_failed(&addr());
        assert!(tracker.is_failed(&addr()));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(tracker.is_failed(&addr()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!tracker.is_failed(&addr()));
        assert_eq!(tracker.sweep_expired(), 1);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_mark() {
        let tracker = FailureTracker::new("market", Duration::from_secs(300));
        tracker.mark_failed(&addr());
        tracker.clear(&addr());
        assert!(!tracker.is_failed(&addr()));
    }
}
