//! Per-provider circuit breaker.
//!
//! A provider whose attempts keep exhausting their retry budget is taken out
//! of the chain for a while instead of being hammered on every walk:
//!
//! - **Closed**: calls flow normally.
//! - **Open**: calls are skipped until `recovery_timeout` has elapsed.
//! - **HalfOpen**: trial calls flow; enough successes close the circuit, any
//!   failure reopens it.
//!
//! State is in-memory only. A restarted process trusts every provider again.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::models::ProviderId;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Time an open circuit waits before allowing trial calls.
    pub recovery_timeout: Duration,
    /// Trial successes needed to close a half-open circuit.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            half_open_success_threshold: 2,
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failures: u32,
    trial_successes: u32,
    opened_at: Option<Instant>,
}

impl Circuit {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            trial_successes: 0,
            opened_at: None,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.trial_successes = 0;
        self.opened_at = Some(Instant::now());
    }
}

pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether a call to `provider` may go out now.
    ///
    /// Moves an open circuit to HalfOpen once its recovery timeout elapsed.
    pub fn is_allowed(&self, provider: &ProviderId) -> bool {
        let mut circuits = self.lock_circuits();
        let Some(circuit) = circuits.get_mut(provider.as_ref()) else {
            return true;
        };

        if circuit.state != CircuitState::Open {
            return true;
        }

        let recovered = circuit
            .opened_at
            .map(|at| at.elapsed() >= self.config.recovery_timeout)
            .unwrap_or(true);
        if recovered {
            info!("Circuit breaker: '{}' Open -> HalfOpen", provider);
            circuit.state = CircuitState::HalfOpen;
            circuit.trial_successes = 0;
        }
        recovered
    }

    pub fn record_success(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let Some(circuit) = circuits.get_mut(provider.as_ref()) else {
            return;
        };

        match circuit.state {
            CircuitState::Closed => circuit.failures = 0,
            CircuitState::HalfOpen => {
                circuit.trial_successes += 1;
                if circuit.trial_successes >= self.config.half_open_success_threshold {
                    info!("Circuit breaker: '{}' HalfOpen -> Closed", provider);
                    *circuit = Circuit::closed();
                }
            }
            CircuitState::Open => {
                debug!("Circuit breaker: late success for '{}' while open", provider);
            }
        }
    }

    pub fn record_failure(&self, provider: &ProviderId) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::closed);
        circuit.failures += 1;

        match circuit.state {
            CircuitState::Closed if circuit.failures >= self.config.failure_threshold => {
                info!(
                    "Circuit breaker: opening '{}' after {} failures",
                    provider, circuit.failures
                );
                circuit.open();
            }
            CircuitState::Closed => {
                debug!(
                    "Circuit breaker: failure for '{}' ({}/{})",
                    provider, circuit.failures, self.config.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                info!("Circuit breaker: '{}' HalfOpen -> Open", provider);
                circuit.open();
            }
            CircuitState::Open => circuit.opened_at = Some(Instant::now()),
        }
    }

    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock_circuits()
            .get(provider.as_ref())
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn reset(&self, provider: &ProviderId) {
        self.lock_circuits().remove(provider.as_ref());
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
