//! Provider identity and configuration.
//!
//! Configuration is validated when it is loaded (see [`ProviderConfig::validate`]
//! and [`ProviderId::new`]) so that the acquisition path never has to inspect
//! loosely-typed settings.

use core::fmt;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityKind;
use crate::error::RichdadError;
use crate::window::{WindowKind, WindowLimit, builtin_limits};

/// Stable provider identifier such as `"twelvedata"` or `"gemini"`.
///
/// Ids are non-empty, lowercase and contain no whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProviderId(String);

impl ProviderId {
    /// Validate and wrap a provider id.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the id is empty, contains whitespace or
    /// uppercase characters.
    pub fn new(id: impl Into<String>) -> Result<Self, RichdadError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RichdadError::invalid_config("provider id must not be empty"));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
            return Err(RichdadError::invalid_config(format!(
                "provider id `{id}` must be lowercase without whitespace"
            )));
        }
        Ok(Self(id))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProviderId {
    type Error = RichdadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = RichdadError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ProviderId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProviderId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Opaque handle to a stored credential (for example a keyring entry name).
///
/// The secret itself never passes through the acquisition layer.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialRef(String);

impl CredentialRef {
    /// Wrap a credential handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The handle, to be resolved by the fetcher.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialRef(<redacted>)")
    }
}

/// Subscription tier. Selects the provider's window limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Free tier with the provider's published free limits.
    #[default]
    Free,
    /// Paid plan with higher limits.
    Premium,
    /// No client-side budget enforcement.
    Unlimited,
}

/// Capability-specific settings with a fixed schema per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ProviderCapability {
    /// Market-data provider.
    MarketData {
        /// Whether the provider serves delayed data (e.g. a 15-minute delayed free tier).
        #[serde(default)]
        delayed: bool,
    },
    /// AI recommendation provider.
    Ai {
        /// Model identifier passed to the provider.
        model: String,
    },
}

impl ProviderCapability {
    /// Capability kind of this variant.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::MarketData { .. } => CapabilityKind::MarketData,
            Self::Ai { .. } => CapabilityKind::Ai,
        }
    }
}

const fn default_enabled() -> bool {
    true
}

/// Configuration of a single provider as supplied by the settings layer.
///
/// `priority` is a dense rank within the capability kind (1 = primary). When a
/// config is added to a registry with priority `0` it is appended to the end of
/// its chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Stable provider id.
    pub id: ProviderId,
    /// Capability kind and its settings.
    pub capability: ProviderCapability,
    /// Dense rank within the capability kind.
    #[serde(default)]
    pub priority: u32,
    /// Disabled providers are never selected.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Subscription tier.
    #[serde(default)]
    pub tier: Tier,
    /// Credential handle resolved by the fetcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialRef>,
    /// Explicit window limits overriding the built-in tier table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Vec<WindowLimit>>,
}

impl ProviderConfig {
    /// Create an enabled market-data provider on the free tier.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `id` is not a valid provider id.
    pub fn market_data(id: impl Into<String>) -> Result<Self, RichdadError> {
        Ok(Self::new(
            ProviderId::new(id)?,
            ProviderCapability::MarketData { delayed: false },
        ))
    }

    /// Create an enabled AI provider on the free tier.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `id` is not a valid provider id or `model` is empty.
    pub fn ai(id: impl Into<String>, model: impl Into<String>) -> Result<Self, RichdadError> {
        let cfg = Self::new(
            ProviderId::new(id)?,
            ProviderCapability::Ai {
                model: model.into(),
            },
        );
        cfg.validate()?;
        Ok(cfg)
    }

    /// Create an enabled config with no explicit priority.
    #[must_use]
    pub const fn new(id: ProviderId, capability: ProviderCapability) -> Self {
        Self {
            id,
            capability,
            priority: 0,
            enabled: true,
            tier: Tier::Free,
            credential: None,
            limits: None,
        }
    }

    /// Set the desired rank.
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the tier.
    #[must_use]
    pub const fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    /// Enable or disable the provider.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Attach a credential handle.
    #[must_use]
    pub fn with_credential(mut self, credential: CredentialRef) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Override the tier's window limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Vec<WindowLimit>) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Mark a market-data provider as serving delayed data. No-op for AI providers.
    #[must_use]
    pub fn delayed(mut self, delayed: bool) -> Self {
        if let ProviderCapability::MarketData { delayed: d } = &mut self.capability {
            *d = delayed;
        }
        self
    }

    /// Capability kind of this provider.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        self.capability.kind()
    }

    /// Static delay flag; always `false` for AI providers.
    #[must_use]
    pub const fn is_delayed(&self) -> bool {
        matches!(self.capability, ProviderCapability::MarketData { delayed: true })
    }

    /// Effective window limits: the explicit override or the built-in table.
    #[must_use]
    pub fn window_limits(&self) -> Vec<WindowLimit> {
        self.limits
            .clone()
            .unwrap_or_else(|| builtin_limits(self.id.as_str(), self.tier))
    }

    /// Kinds of the effective windows; these are charged on every success.
    #[must_use]
    pub fn window_kinds(&self) -> Vec<WindowKind> {
        self.window_limits().iter().map(|l| l.kind).collect()
    }

    /// Validate the capability schema and explicit limits.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for an empty AI model, a zero limit, or a window
    /// kind listed more than once.
    pub fn validate(&self) -> Result<(), RichdadError> {
        if let ProviderCapability::Ai { model } = &self.capability
            && model.trim().is_empty()
        {
            return Err(RichdadError::invalid_config(format!(
                "ai provider `{}` requires a model",
                self.id
            )));
        }
        if let Some(limits) = &self.limits {
            let mut seen: HashSet<WindowKind> = HashSet::new();
            for l in limits {
                if l.limit == 0 {
                    return Err(RichdadError::invalid_config(format!(
                        "provider `{}`: {} limit must be greater than zero",
                        self.id, l.kind
                    )));
                }
                if !seen.insert(l.kind) {
                    return Err(RichdadError::invalid_config(format!(
                        "provider `{}`: duplicate {} window",
                        self.id, l.kind
                    )));
                }
            }
        }
        Ok(())
    }
}
