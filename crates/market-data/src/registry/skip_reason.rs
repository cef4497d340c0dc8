//! Per-walk diagnostics: what each provider in a chain did.

use crate::errors::ErrorKind;
use crate::models::ProviderId;

/// Why a provider was not called at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Circuit breaker is open for this provider.
    CircuitBreakerOpen,
    /// Provider does not serve this data class.
    Unsupported,
}

/// Outcome of one provider within a chain walk.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    Skipped(SkipReason),
    /// Provider errored after `tries` calls.
    Failed {
        kind: ErrorKind,
        message: String,
        tries: u32,
    },
    /// Provider answered but the answer was rejected.
    Rejected { reason: String },
    /// Provider contributed an accepted answer (or some market fields).
    Success,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub outcome: AttemptOutcome,
}

/// Ordered record of a chain walk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.push(provider_id, AttemptOutcome::Skipped(reason));
    }

    pub fn record_error(&mut self, provider_id: ProviderId, kind: ErrorKind, message: String, tries: u32) {
        self.push(
            provider_id,
            AttemptOutcome::Failed {
                kind,
                message,
                tries,
            },
        );
    }

    pub fn record_rejection(&mut self, provider_id: ProviderId, reason: String) {
        self.push(provider_id, AttemptOutcome::Rejected { reason });
    }

    pub fn record_success(&mut self, provider_id: ProviderId) {
        self.push(provider_id, AttemptOutcome::Success);
    }

    fn push(&mut self, provider_id: ProviderId, outcome: AttemptOutcome) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            outcome,
        });
    }

    /// One-line summary for logs, e.g. `A: timeout -> B: rejected (blacklisted) -> C: ok`.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Success => format!("{}: ok", a.provider_id),
                AttemptOutcome::Skipped(SkipReason::CircuitBreakerOpen) => {
                    format!("{}: skipped (circuit open)", a.provider_id)
                }
                AttemptOutcome::Skipped(SkipReason::Unsupported) => {
                    format!("{}: skipped (unsupported)", a.provider_id)
                }
                AttemptOutcome::Failed { kind, tries, .. } if *tries > 1 => {
                    format!("{}: {} x{}", a.provider_id, kind, tries)
                }
                AttemptOutcome::Failed { kind, .. } => format!("{}: {}", a.provider_id, kind),
                AttemptOutcome::Rejected { reason } => {
                    format!("{}: rejected ({})", a.provider_id, reason)
                }
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Success)
    }

    /// True when some provider affirmatively answered with rejected data.
    ///
    /// This is what separates a definitive "no" from transport noise.
    pub fn has_explicit_rejection(&self) -> bool {
        self.attempts.iter().any(|a| match &a.outcome {
            AttemptOutcome::Rejected { .. } => true,
            AttemptOutcome::Failed { kind, .. } => *kind == ErrorKind::ExplicitInvalid,
            _ => false,
        })
    }

    /// Number of providers actually called.
    pub fn dispatched(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| !matches!(a.outcome, AttemptOutcome::Skipped(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_error(Cow::Borrowed("A"), ErrorKind::Transient, "timeout".into(), 3);
        diag.record_rejection(Cow::Borrowed("B"), "symbol blacklisted".into());
        diag.record_skip(Cow::Borrowed("D"), SkipReason::CircuitBreakerOpen);
        diag.record_success(Cow::Borrowed("C"));

        assert_eq!(
            diag.summary(),
            "A: transient x3 -> B: rejected (symbol blacklisted) -> D: skipped (circuit open) -> C: ok"
        );
        assert_eq!(diag.dispatched(), 3);
    }

    #[test]
    fn test_explicit_rejection_detection() {
        let mut diag = FetchDiagnostics::new();
        diag.record_error(Cow::Borrowed("A"), ErrorKind::RateLimited, "429".into(), 4);
        diag.record_error(Cow::Borrowed("B"), ErrorKind::NotFound, "404".into(), 1);
        assert!(!diag.has_explicit_rejection());
        assert!(!diag.has_success());

        diag.record_error(
            Cow::Borrowed("C"),
            ErrorKind::ExplicitInvalid,
            "negative price".into(),
            1,
        );
        assert!(diag.has_explicit_rejection());
    }
}
