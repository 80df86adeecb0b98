use core::fmt;
use serde::{Deserialize, Serialize};

/// Capability kind a provider serves. Fallback chains are built per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    /// Quotes, historical candles and news.
    MarketData,
    /// AI-generated recommendations.
    Ai,
}

impl CapabilityKind {
    /// Stable, kebab-case identifier for logs/errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarketData => "market-data",
            Self::Ai => "ai",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of resource being fetched.
///
/// Used as the prefix of a [`ResourceKey`](crate::ResourceKey) and to pick the
/// freshness threshold for a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum ResourceType {
    /// Point-in-time quote.
    Quote,
    /// Historical OHLCV candles for a chart.
    Chart,
    /// AI recommendation for an instrument.
    Recommendation,
    /// Headlines for an instrument or market.
    News,
}

impl ResourceType {
    /// Key prefix used when formatting resource keys.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Chart => "chart",
            Self::Recommendation => "reco",
            Self::News => "news",
        }
    }

    /// Parse a key prefix back into a resource type.
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "quote" => Some(Self::Quote),
            "chart" => Some(Self::Chart),
            "reco" => Some(Self::Recommendation),
            "news" => Some(Self::News),
            _ => None,
        }
    }

    /// Capability kind that normally serves this resource.
    #[must_use]
    pub const fn capability(self) -> CapabilityKind {
        match self {
            Self::Recommendation => CapabilityKind::Ai,
            Self::Quote | Self::Chart | Self::News => CapabilityKind::MarketData,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
