use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod history;
pub mod quotes;

/// Point-in-time quote payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFixture {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub shortname: String,
    /// Last traded price.
    pub price: Decimal,
    /// Previous session close.
    pub previous_close: Decimal,
    /// ISO currency code.
    pub currency: String,
}

impl QuoteFixture {
    /// Absolute change against the previous close.
    #[must_use]
    pub fn change(&self) -> Decimal {
        self.price - self.previous_close
    }
}

/// One OHLCV candle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleFixture {
    /// Candle open time.
    pub ts: DateTime<Utc>,
    /// Open.
    pub open: Decimal,
    /// High.
    pub high: Decimal,
    /// Low.
    pub low: Decimal,
    /// Close.
    pub close: Decimal,
    /// Traded volume.
    pub volume: u64,
}

/// Direction of an AI recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
    /// Open or add to a position.
    Buy,
    /// Keep the current position.
    Hold,
    /// Reduce or close a position.
    Sell,
}

/// AI-generated recommendation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationFixture {
    /// Ticker symbol.
    pub symbol: String,
    /// Suggested action.
    pub action: RecommendationAction,
    /// Model confidence, 0 to 100.
    pub confidence: u8,
    /// Short free-text rationale.
    pub rationale: String,
}
