//! Background cache maintenance.
//!
//! One owned task per [`Maintenance`] instance, started explicitly and stopped
//! through its [`MaintenanceHandle`]:
//!
//! - every `sweep_interval`: reclaim expired L1 entries, expired failure marks
//!   and abandoned single-flight entries
//! - every `purge_interval`: delete durable identities that no longer pass the
//!   validator
//!
//! The task never holds a lock that request paths need across an await, so it
//! neither blocks nor is blocked by in-flight resolutions.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::cache::CacheHierarchy;
use crate::config::ResolverConfig;
use crate::constants::{DEFAULT_PURGE_INTERVAL, DEFAULT_SWEEP_INTERVAL, PURGE_PAGE_SIZE};
use crate::errors::Result;
use crate::failure_tracker::FailureTracker;
use crate::identity::DurableStore;
use crate::single_flight::SingleFlight;
use tokenlens_market_data::IdentityValidator;

/// Something holding expiring state that can be swept.
pub trait Sweep: Send + Sync {
    /// Drops expired state. Returns how many entries were removed.
    fn sweep(&self) -> usize;
}

impl Sweep for CacheHierarchy {
    fn sweep(&self) -> usize {
        self.sweep_memory()
    }
}

impl Sweep for FailureTracker {
    fn sweep(&self) -> usize {
        self.sweep_expired()
    }
}

impl<K, T> Sweep for SingleFlight<K, T>
where
    K: Eq + std::hash::Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> usize {
        self.purge_abandoned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaintenanceConfig {
    pub sweep_interval: Duration,
    pub purge_interval: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }
}

impl From<&ResolverConfig> for MaintenanceConfig {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            sweep_interval: config.sweep_interval,
            purge_interval: config.purge_interval,
        }
    }
}

pub struct Maintenance {
    cache: Arc<CacheHierarchy>,
    validator: IdentityValidator,
    sweepers: Vec<(&'static str, Arc<dyn Sweep>)>,
}

impl Maintenance {
    /// Maintenance for a cache on its own: L1 sweep and poisoned-record purge.
    pub fn new(cache: Arc<CacheHierarchy>, validator: IdentityValidator) -> Self {
        let l1: Arc<dyn Sweep> = cache.clone();
        Self {
            cache,
            validator,
            sweepers: vec![("l1", l1)],
        }
    }

    /// Adds more expiring state to the short-interval sweep.
    pub fn with_sweeper(mut self, name: &'static str, sweeper: Arc<dyn Sweep>) -> Self {
        self.sweepers.push((name, sweeper));
        self
    }

    /// Runs every sweeper once.
    pub fn sweep(&self) -> usize {
        let mut total = 0;
        for (name, sweeper) in &self.sweepers {
            let removed = sweeper.sweep();
            if removed > 0 {
                debug!("Swept {} expired {} entries", removed, name);
            }
            total += removed;
        }
        total
    }

    /// Runs the poisoned-record purge once.
    pub async fn purge_poisoned(&self) -> Result<usize> {
        purge_poisoned(self.cache.durable().as_ref(), &self.validator).await
    }

    /// Spawns the maintenance task. Must be called within a Tokio runtime.
    pub fn start(self, config: MaintenanceConfig) -> MaintenanceHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                "Cache maintenance started (sweep every {}s, purge every {}s)",
                config.sweep_interval.as_secs(),
                config.purge_interval.as_secs()
            );

            let mut sweep_interval = interval(config.sweep_interval);
            sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut purge_interval = interval(config.purge_interval);
            purge_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = sweep_interval.tick() => {
                        self.sweep();
                    }
                    _ = purge_interval.tick() => {
                        match self.purge_poisoned().await {
                            Ok(0) => debug!("Poisoned-record purge found nothing"),
                            Ok(removed) => info!("Purged {} poisoned identity records", removed),
                            Err(e) => warn!("Poisoned-record purge failed: {}", e),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Cache maintenance stopped");
        });

        MaintenanceHandle {
            shutdown,
            task: Some(task),
        }
    }
}

/// Owner of a running maintenance task. Dropping it aborts the task.
pub struct MaintenanceHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Signals the task and waits for it to finish its current step.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Cache maintenance task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Deletes every durable record the validator would now reject.
///
/// Scans the store page by page; returns the number of records removed.
pub async fn purge_poisoned(store: &dyn DurableStore, validator: &IdentityValidator) -> Result<usize> {
    let mut cursor: Option<String> = None;
    let mut removed = 0;

    loop {
        let page = store.scan(cursor.as_deref(), PURGE_PAGE_SIZE).await?;

        let poisoned: Vec<String> = page
            .records
            .iter()
            .filter_map(|record| {
                validator
                    .check(&record.address, &record.symbol, &record.name)
                    .err()
                    .map(|rejection| {
                        info!(
                            "Purging identity for {} ({:?}/{:?}): {}",
                            record.address, record.symbol, record.name, rejection
                        );
                        record.address.to_string()
                    })
            })
            .collect();

        if !poisoned.is_empty() {
            removed += store.delete(&poisoned).await?;
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(removed)
}
