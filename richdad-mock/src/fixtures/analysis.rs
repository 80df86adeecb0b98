use super::{RecommendationAction, RecommendationFixture};

/// AI recommendation fixture for a symbol.
pub fn recommendation_by_symbol(s: &str) -> Option<RecommendationFixture> {
    let (action, confidence, rationale) = match s {
        "AAPL" => (RecommendationAction::Hold, 62, "Valuation stretched after the recent run-up."),
        "NVDA" => (RecommendationAction::Buy, 78, "Data-center demand keeps beating guidance."),
        "KO" => (RecommendationAction::Hold, 55, "Defensive; limited upside at current multiple."),
        "TSLA" => (RecommendationAction::Sell, 58, "Margins compressing on price cuts."),
        _ => return None,
    };
    Some(RecommendationFixture {
        symbol: s.to_string(),
        action,
        confidence,
        rationale: rationale.to_string(),
    })
}
