//! Per-provider attempt diagnostics collected during an acquisition.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchErrorKind;
use crate::provider::ProviderId;

/// What happened when the fallback chain reached a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The provider returned a payload.
    Succeeded,
    /// Skipped without a call because a budget window was full.
    SkippedBudget {
        /// Milliseconds until every blocking window has reset.
        retry_in_ms: Option<u64>,
    },
    /// Skipped because no fetcher is registered for this provider.
    NoFetcher,
    /// The fetcher failed.
    Failed {
        /// Failure category.
        kind: FetchErrorKind,
        /// Whether the fetcher marked the failure retriable.
        retriable: bool,
        /// Error message.
        message: String,
    },
    /// The per-attempt deadline elapsed.
    TimedOut {
        /// Deadline that was exceeded.
        timeout_ms: u64,
    },
}

/// One provider visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// Provider that was considered.
    pub provider_id: ProviderId,
    /// Result of the visit.
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Ordered record of every provider an acquisition considered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptTrail {
    attempts: Vec<Attempt>,
}

impl AttemptTrail {
    /// Create an empty trail.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    /// Append a visit.
    pub fn push(&mut self, provider_id: ProviderId, outcome: AttemptOutcome) {
        self.attempts.push(Attempt {
            provider_id,
            outcome,
        });
    }

    /// All visits, in order.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Number of visits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// True when no provider was considered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Provider ids in visit order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderId> {
        self.attempts.iter().map(|a| &a.provider_id)
    }

    /// True if any provider rejected the credentials.
    #[must_use]
    pub fn any_auth_failure(&self) -> bool {
        self.attempts.iter().any(|a| {
            matches!(
                a.outcome,
                AttemptOutcome::Failed {
                    kind: FetchErrorKind::Auth,
                    ..
                }
            )
        })
    }

    /// True if every visit was a budget skip.
    #[must_use]
    pub fn all_budget_skipped(&self) -> bool {
        !self.attempts.is_empty()
            && self
                .attempts
                .iter()
                .all(|a| matches!(a.outcome, AttemptOutcome::SkippedBudget { .. }))
    }

    /// Summary for logging, e.g. `a: SKIPPED(budget) -> b: FAILED(network) -> c: OK`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AttemptTrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return f.write_str("no providers configured");
        }
        for (i, a) in self.attempts.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            match &a.outcome {
                AttemptOutcome::Succeeded => write!(f, "{}: OK", a.provider_id)?,
                AttemptOutcome::SkippedBudget { .. } => {
                    write!(f, "{}: SKIPPED(budget)", a.provider_id)?;
                }
                AttemptOutcome::NoFetcher => write!(f, "{}: SKIPPED(no fetcher)", a.provider_id)?,
                AttemptOutcome::Failed { kind, .. } => {
                    write!(f, "{}: FAILED({kind})", a.provider_id)?;
                }
                AttemptOutcome::TimedOut { timeout_ms } => {
                    write!(f, "{}: TIMEOUT({timeout_ms}ms)", a.provider_id)?;
                }
            }
        }
        Ok(())
    }
}
