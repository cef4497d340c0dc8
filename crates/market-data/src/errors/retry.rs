/// Classification for retry policy.
///
/// Used by the provider chain to decide what to do after a provider error.
///
/// # Behavior Summary
///
/// | Class | Retry same provider? | Then | Circuit breaker failure? |
/// |-------|---------------------|------|--------------------------|
/// | `Never` | No | Abort the walk | No |
/// | `ExponentialBackoff` | Yes, `base * 2^attempt` + jitter, capped | Next provider | Yes, once exhausted |
/// | `LinearBackoff` | Yes, `step * attempt` | Next provider | Yes, once exhausted |
/// | `NextProvider` | No | Next provider | No |
/// | `CircuitOpen` | No | Next provider | No (already recorded) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry. The request itself is invalid.
    Never,

    /// Rate limited (HTTP 429). Back off exponentially with jitter for a
    /// small fixed number of attempts, then move on.
    ExponentialBackoff,

    /// Transport failure (timeout, connection reset, 5xx). Retry a bounded
    /// number of times with linear backoff, then move on.
    LinearBackoff,

    /// The provider answered definitively (not found, unsupported, or
    /// rejected data). Move on without penalty.
    NextProvider,

    /// Circuit breaker is open for this provider.
    CircuitOpen,
}
