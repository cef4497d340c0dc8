//! Request coalescing.
//!
//! Concurrent callers asking for the same key share one underlying computation.
//! The registry holds only a weak handle, so when every caller has given up
//! (for example on its deadline) the computation is dropped mid-walk rather
//! than left running, and the next caller starts a fresh one.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};

/// A joinable, cloneable handle to an in-flight computation.
pub type Flight<T> = Shared<BoxFuture<'static, T>>;

type Registry<K, T> = Arc<Mutex<HashMap<K, WeakShared<BoxFuture<'static, T>>>>>;

pub struct SingleFlight<K, T> {
    inflight: Registry<K, T>,
}

impl<K, T> Default for SingleFlight<K, T> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the computation running for `key`, or starts `make()` if there is
    /// none. `make` is not called when joining.
    pub fn join<F, Fut>(&self, key: K, make: F) -> Flight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(flight) = inflight.get(&key).and_then(|weak| weak.upgrade()) {
            return flight;
        }

        let registry = Arc::clone(&self.inflight);
        let done_key = key.clone();
        let work = make();
        let flight = async move {
            let output = work.await;
            // A live flight cannot be replaced, so this entry is still ours.
            registry
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .remove(&done_key);
            output
        }
        .boxed()
        .shared();

        if let Some(weak) = flight.downgrade() {
            inflight.insert(key, weak);
        }
        flight
    }

    /// Number of computations that still have at least one waiter.
    pub fn in_flight(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .filter(|weak| weak.upgrade().is_some())
            .count()
    }

    /// Forgets computations abandoned by all their callers. Returns how many
    /// entries were dropped.
    pub fn purge_abandoned(&self) -> usize {
        let mut inflight = self.inflight.lock().unwrap_or_else(|p| p.into_inner());
        let before = inflight.len();
        inflight.retain(|_, weak| weak.upgrade().is_some());
        before - inflight.len()
    }
}
