use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attempts::AttemptTrail;
use crate::capability::CapabilityKind;

/// Failure category reported by a provider fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The provider rejected the call for exceeding its quota.
    RateLimited,
    /// Missing, invalid or expired credentials.
    Auth,
    /// Transport failure, including per-attempt timeouts.
    Network,
    /// The provider answered with a server-side failure or unusable payload.
    Server,
}

impl FetchErrorKind {
    /// Stable identifier for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error raised by a provider fetcher.
///
/// The wire protocol behind a fetcher is provider-specific; this is the only
/// shape the orchestrator needs to decide how to fall back.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} error (retriable={retriable}): {message}")]
pub struct FetchError {
    /// Failure category.
    pub kind: FetchErrorKind,
    /// Whether the same call could succeed if repeated later.
    pub retriable: bool,
    /// Human-readable description.
    pub message: String,
    /// Provider-supplied hint for when to retry, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

impl FetchError {
    /// Build an error of an arbitrary kind.
    pub fn new(kind: FetchErrorKind, retriable: bool, message: impl Into<String>) -> Self {
        Self {
            kind,
            retriable,
            message: message.into(),
            retry_after_ms: None,
        }
    }

    /// Helper: provider-side rate limit rejection.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::RateLimited, true, message)
    }

    /// Helper: authentication failure (never retriable).
    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Auth, false, message)
    }

    /// Helper: transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, true, message)
    }

    /// Helper: server-side failure.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Server, true, message)
    }

    /// Helper: an attempt exceeded its deadline. Modeled as a retriable network error.
    pub fn timeout(provider: impl fmt::Display, timeout_ms: u64) -> Self {
        Self::network(format!("{provider} timed out after {timeout_ms}ms"))
    }

    /// Attach a retry-after hint.
    #[must_use]
    pub const fn with_retry_after_ms(mut self, ms: u64) -> Self {
        self.retry_after_ms = Some(ms);
        self
    }
}

/// Unified error type for the richdad workspace.
///
/// Per-provider failures are absorbed by the orchestrator's fallback loop; the
/// only error an acquisition surfaces is [`RichdadError::AllProvidersExhausted`].
/// The remaining variants are configuration errors raised at load time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RichdadError {
    /// No provider of the requested kind could serve the resource.
    #[error("all {capability} providers exhausted for {resource}: {attempts}")]
    AllProvidersExhausted {
        /// Capability kind that was requested.
        capability: CapabilityKind,
        /// Resource key, formatted.
        resource: String,
        /// What happened to each provider that was considered.
        attempts: AttemptTrail,
    },

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A provider id was registered twice.
    #[error("duplicate provider: {0}")]
    DuplicateProvider(String),

    /// A provider id is not registered.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

impl RichdadError {
    /// Helper: build an `InvalidConfig` error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns true if the user should be pointed at provider settings.
    ///
    /// Exhaustion caused only by budget skips resolves itself once a window
    /// resets; anything involving an auth failure or a missing provider needs
    /// the user's attention.
    #[must_use]
    pub fn needs_setup(&self) -> bool {
        match self {
            Self::AllProvidersExhausted { attempts, .. } => {
                attempts.is_empty() || attempts.any_auth_failure()
            }
            Self::InvalidConfig(_) | Self::DuplicateProvider(_) | Self::UnknownProvider(_) => true,
        }
    }
}
