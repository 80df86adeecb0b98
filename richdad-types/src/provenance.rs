//! Provenance of completed fetches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attempts::AttemptTrail;
use crate::provider::ProviderId;

/// Where a payload came from and how old it is.
///
/// Always present on a completed fetch. `cache_age_ms` and `is_fresh` are
/// derived from `fetched_at`; use [`refreshed`](Self::refreshed) to recompute
/// them when re-rendering a cached value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceDescriptor {
    /// Provider that served the payload.
    pub provider_id: ProviderId,
    /// Wall-clock time the payload was received.
    pub fetched_at: DateTime<Utc>,
    /// Static delay flag of the provider.
    pub is_delayed: bool,
    /// Milliseconds elapsed since `fetched_at` at evaluation time.
    pub cache_age_ms: u64,
    /// Whether `cache_age_ms` was below the resource's freshness threshold.
    pub is_fresh: bool,
}

impl DataSourceDescriptor {
    /// Recompute the derived fields against `now` and a freshness threshold.
    #[must_use]
    pub fn refreshed(mut self, now: DateTime<Utc>, threshold_ms: u64) -> Self {
        self.cache_age_ms = age_ms(self.fetched_at, now);
        self.is_fresh = self.cache_age_ms < threshold_ms;
        self
    }
}

/// Milliseconds from `fetched_at` to `now`, saturating at zero for clock skew.
#[must_use]
pub fn age_ms(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - fetched_at).num_milliseconds()).unwrap_or(0)
}

/// A payload together with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult<T> {
    /// Provider payload, opaque to the acquisition layer.
    pub payload: T,
    /// Provenance and freshness.
    pub source: DataSourceDescriptor,
    /// Providers considered before the payload was obtained.
    pub attempts: AttemptTrail,
}
