//! Age and delay classification of fetched payloads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use richdad_types::{
    DataSourceDescriptor, FreshnessConfig, ProviderConfig, ResourceType, age_ms,
};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// Result of [`FreshnessEvaluator::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    /// Milliseconds since the payload was fetched.
    pub cache_age_ms: u64,
    /// `cache_age_ms < threshold` for the resource type.
    pub is_fresh: bool,
    /// Static delay flag of the provider, independent of age.
    pub is_delayed: bool,
}

/// Classifies payload age against per-resource thresholds.
///
/// Purely descriptive: nothing here feeds back into provider selection.
#[derive(Clone)]
pub struct FreshnessEvaluator {
    clock: Arc<dyn Clock>,
    config: FreshnessConfig,
}

impl std::fmt::Debug for FreshnessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshnessEvaluator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FreshnessEvaluator {
    /// Create an evaluator reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, config: FreshnessConfig) -> Self {
        Self { clock, config }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &FreshnessConfig {
        &self.config
    }

    /// Classify a payload fetched at `fetched_at` from `provider`.
    #[must_use]
    pub fn evaluate(
        &self,
        fetched_at: DateTime<Utc>,
        provider: &ProviderConfig,
        resource: ResourceType,
    ) -> Freshness {
        let cache_age_ms = age_ms(fetched_at, self.clock.now());
        Freshness {
            cache_age_ms,
            is_fresh: cache_age_ms < self.config.threshold_ms(resource),
            is_delayed: provider.is_delayed(),
        }
    }

    /// Build the provenance descriptor for a payload.
    #[must_use]
    pub fn describe(
        &self,
        fetched_at: DateTime<Utc>,
        provider: &ProviderConfig,
        resource: ResourceType,
    ) -> DataSourceDescriptor {
        let f = self.evaluate(fetched_at, provider, resource);
        DataSourceDescriptor {
            provider_id: provider.id.clone(),
            fetched_at,
            is_delayed: f.is_delayed,
            cache_age_ms: f.cache_age_ms,
            is_fresh: f.is_fresh,
        }
    }

    /// Re-derive age and freshness of a previously built descriptor.
    #[must_use]
    pub fn refresh(
        &self,
        source: DataSourceDescriptor,
        resource: ResourceType,
    ) -> DataSourceDescriptor {
        source.refreshed(self.clock.now(), self.config.threshold_ms(resource))
    }
}
