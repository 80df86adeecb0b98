//! Budget window kinds and the built-in per-tier limit table.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::provider::Tier;

/// Fixed-duration accounting window.
///
/// Windows are aligned to the Unix epoch: a window starts at
/// `floor(now / period) * period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowKind {
    /// 60 second window.
    Minute,
    /// 24 hour window (UTC days).
    Day,
}

impl WindowKind {
    /// Window period in milliseconds.
    #[must_use]
    pub const fn period_ms(self) -> i64 {
        match self {
            Self::Minute => 60_000,
            Self::Day => 86_400_000,
        }
    }

    /// Stable identifier for logs and usage meters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Day => "day",
        }
    }

    /// Start of the window containing `now_ms`.
    #[must_use]
    pub const fn window_start(self, now_ms: i64) -> i64 {
        now_ms.div_euclid(self.period_ms()) * self.period_ms()
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum number of calls allowed within one window of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowLimit {
    /// Window the limit applies to.
    pub kind: WindowKind,
    /// Calls permitted per window; always greater than zero.
    pub limit: u64,
}

impl WindowLimit {
    /// Convenience constructor.
    #[must_use]
    pub const fn new(kind: WindowKind, limit: u64) -> Self {
        Self { kind, limit }
    }

    /// Per-minute limit.
    #[must_use]
    pub const fn per_minute(limit: u64) -> Self {
        Self::new(WindowKind::Minute, limit)
    }

    /// Per-day limit.
    #[must_use]
    pub const fn per_day(limit: u64) -> Self {
        Self::new(WindowKind::Day, limit)
    }
}

/// Published limits for the providers the terminal ships integrations for.
///
/// Providers not listed here (and any provider on [`Tier::Unlimited`]) own no
/// windows unless their configuration carries explicit limits.
#[must_use]
pub fn builtin_limits(provider_id: &str, tier: Tier) -> Vec<WindowLimit> {
    match (provider_id, tier) {
        (_, Tier::Unlimited) => vec![],
        ("twelvedata", Tier::Free) => vec![WindowLimit::per_minute(8), WindowLimit::per_day(800)],
        ("twelvedata", Tier::Premium) => vec![WindowLimit::per_minute(55)],
        ("alphavantage", Tier::Free) => vec![WindowLimit::per_minute(5), WindowLimit::per_day(25)],
        ("alphavantage", Tier::Premium) => vec![WindowLimit::per_minute(75)],
        ("finnhub", Tier::Free) => vec![WindowLimit::per_minute(60)],
        ("finnhub", Tier::Premium) => vec![WindowLimit::per_minute(300)],
        ("polygon", Tier::Free) => vec![WindowLimit::per_minute(5)],
        ("gemini", Tier::Free) => vec![WindowLimit::per_minute(15), WindowLimit::per_day(1500)],
        ("gemini", Tier::Premium) => vec![WindowLimit::per_minute(1000)],
        ("openai", Tier::Free) => vec![WindowLimit::per_minute(3), WindowLimit::per_day(200)],
        ("openai", Tier::Premium) => vec![WindowLimit::per_minute(500)],
        _ => vec![],
    }
}
