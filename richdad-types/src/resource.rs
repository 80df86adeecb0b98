//! Resource keys: the logical identity of what is being fetched.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capability::ResourceType;
use crate::error::RichdadError;

/// Identity of a fetch, e.g. `chart:AAPL:1d` or `quote:MSFT`.
///
/// Two requests with equal keys compete for the same slot in the request
/// sequencer; the newer one supersedes the older.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceKey {
    resource: ResourceType,
    id: String,
}

impl ResourceKey {
    /// Build a key from a resource type and an identifier.
    pub fn new(resource: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource,
            id: id.into(),
        }
    }

    /// Quote for a symbol.
    pub fn quote(symbol: impl Into<String>) -> Self {
        Self::new(ResourceType::Quote, symbol)
    }

    /// Chart for a symbol; interval-specific charts use [`chart_interval`](Self::chart_interval).
    pub fn chart(symbol: impl Into<String>) -> Self {
        Self::new(ResourceType::Chart, symbol)
    }

    /// Chart for a symbol at a given interval, e.g. `chart:AAPL:1d`.
    #[must_use]
    pub fn chart_interval(symbol: &str, interval: &str) -> Self {
        Self::new(ResourceType::Chart, format!("{symbol}:{interval}"))
    }

    /// AI recommendation for a symbol.
    pub fn recommendation(symbol: impl Into<String>) -> Self {
        Self::new(ResourceType::Recommendation, symbol)
    }

    /// News for a symbol or topic.
    pub fn news(topic: impl Into<String>) -> Self {
        Self::new(ResourceType::News, topic)
    }

    /// Resource type, used to pick the freshness threshold.
    #[must_use]
    pub const fn resource_type(&self) -> ResourceType {
        self.resource
    }

    /// Identifier part of the key (everything after the prefix).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource.prefix(), self.id)
    }
}

impl FromStr for ResourceKey {
    type Err = RichdadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, id) = s
            .split_once(':')
            .ok_or_else(|| RichdadError::invalid_config(format!("resource key `{s}` has no prefix")))?;
        let resource = ResourceType::from_prefix(prefix).ok_or_else(|| {
            RichdadError::invalid_config(format!("unknown resource prefix `{prefix}`"))
        })?;
        if id.is_empty() {
            return Err(RichdadError::invalid_config(format!(
                "resource key `{s}` has an empty id"
            )));
        }
        Ok(Self::new(resource, id))
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = RichdadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}
