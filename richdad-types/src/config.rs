//! Configuration types shared by the orchestrator and its collaborators.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::ResourceType;

/// Freshness thresholds per resource type.
///
/// A payload is fresh while its age is strictly below the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Threshold for quotes.
    pub quote: Duration,
    /// Threshold for historical candles.
    pub chart: Duration,
    /// Threshold for AI recommendations.
    pub recommendation: Duration,
    /// Threshold for news headlines.
    pub news: Duration,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(5 * 60),
            chart: Duration::from_secs(60 * 60),
            recommendation: Duration::from_secs(30 * 60),
            news: Duration::from_secs(15 * 60),
        }
    }
}

impl FreshnessConfig {
    /// Threshold for a resource type.
    #[must_use]
    pub const fn threshold(&self, resource: ResourceType) -> Duration {
        match resource {
            ResourceType::Quote => self.quote,
            ResourceType::Chart => self.chart,
            ResourceType::Recommendation => self.recommendation,
            ResourceType::News => self.news,
        }
    }

    /// Threshold for a resource type in milliseconds.
    #[must_use]
    pub fn threshold_ms(&self, resource: ResourceType) -> u64 {
        u64::try_from(self.threshold(resource).as_millis()).unwrap_or(u64::MAX)
    }
}

/// Global configuration for the acquisition orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Deadline for a single provider attempt. Expiry counts as a network
    /// failure and the chain moves on to the next provider.
    pub provider_timeout: Duration,
    /// When a provider answers `rate_limited`, mark its windows full until
    /// they reset so later acquisitions skip it.
    pub saturate_on_rate_limit: bool,
    /// Freshness thresholds used to annotate results.
    pub freshness: FreshnessConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            saturate_on_rate_limit: true,
            freshness: FreshnessConfig::default(),
        }
    }
}
