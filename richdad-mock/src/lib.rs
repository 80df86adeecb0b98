//! Test doubles for richdad provider fetchers.
//!
//! - [`ScriptedFetcher`]: behavior scripted per key from a controller, with a
//!   call log. Use it to stage fallback, timeout and supersede scenarios.
//! - [`FixtureFetcher`]: deterministic payloads from static fixtures for
//!   CI-safe examples.
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use richdad_core::{CancellationToken, FetchError, ProviderConfig, ProviderFetcher, ProviderId};

mod dynamic;
mod fixtures;

pub use dynamic::{MockBehavior, ScriptedController, ScriptedFetcher};
pub use fixtures::{CandleFixture, QuoteFixture, RecommendationAction, RecommendationFixture};

/// Fixture payload lookups, for asserting on what a fetcher returned.
pub mod fixture {
    pub use crate::fixtures::analysis::recommendation_by_symbol;
    pub use crate::fixtures::history::by_symbol as candles_by_symbol;
    pub use crate::fixtures::quotes::by_symbol as quote_by_symbol;
}

/// Fetcher serving static fixtures, with a few magic symbols:
///
/// - `FAIL`: server error.
/// - `LIMITED`: rate-limited error.
/// - `AUTH`: authentication error.
/// - `TIMEOUT`: answers only after 200 ms.
pub struct FixtureFetcher {
    id: ProviderId,
    latency: Option<Duration>,
}

impl FixtureFetcher {
    /// Fixture fetcher answering as provider `id`.
    #[must_use]
    pub const fn new(id: ProviderId) -> Self {
        Self { id, latency: None }
    }

    /// Add a fixed delay before every answer.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn gate(&self, symbol: &str, token: &CancellationToken) -> Result<(), FetchError> {
        let delay = match symbol {
            "FAIL" => return Err(FetchError::server(format!("{}: forced failure", self.id))),
            "LIMITED" => {
                return Err(FetchError::rate_limited(format!("{}: too many requests", self.id))
                    .with_retry_after_ms(60_000));
            }
            "AUTH" => return Err(FetchError::auth(format!("{}: invalid api key", self.id))),
            // Keep short to avoid slowing tests excessively
            "TIMEOUT" => Some(Duration::from_millis(200)),
            _ => self.latency,
        };
        if let Some(d) = delay {
            tokio::select! {
                () = tokio::time::sleep(d) => {}
                () = token.cancelled() => {
                    return Err(FetchError::network(format!("{}: request cancelled", self.id)));
                }
            }
        }
        Ok(())
    }

    fn not_found(&self, what: &str, symbol: &str) -> FetchError {
        FetchError::new(
            richdad_core::FetchErrorKind::Server,
            false,
            format!("{}: no {what} for {symbol}", self.id),
        )
    }
}

#[async_trait]
impl ProviderFetcher<String, QuoteFixture> for FixtureFetcher {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        _provider: &ProviderConfig,
        symbol: &String,
        token: CancellationToken,
    ) -> Result<QuoteFixture, FetchError> {
        self.gate(symbol, &token).await?;
        fixtures::quotes::by_symbol(symbol).ok_or_else(|| self.not_found("quote", symbol))
    }
}

#[async_trait]
impl ProviderFetcher<String, Vec<CandleFixture>> for FixtureFetcher {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        _provider: &ProviderConfig,
        symbol: &String,
        token: CancellationToken,
    ) -> Result<Vec<CandleFixture>, FetchError> {
        self.gate(symbol, &token).await?;
        fixtures::history::by_symbol(symbol).ok_or_else(|| self.not_found("history", symbol))
    }
}

#[async_trait]
impl ProviderFetcher<String, RecommendationFixture> for FixtureFetcher {
    fn provider_id(&self) -> &ProviderId {
        &self.id
    }

    async fn fetch(
        &self,
        _provider: &ProviderConfig,
        symbol: &String,
        token: CancellationToken,
    ) -> Result<RecommendationFixture, FetchError> {
        self.gate(symbol, &token).await?;
        fixtures::analysis::recommendation_by_symbol(symbol)
            .ok_or_else(|| self.not_found("recommendation", symbol))
    }
}
