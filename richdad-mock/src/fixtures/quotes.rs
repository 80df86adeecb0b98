use rust_decimal::Decimal;

use super::QuoteFixture;

/// Quote fixture for a symbol.
pub fn by_symbol(s: &str) -> Option<QuoteFixture> {
    match s {
        "AAPL" => Some(q("AAPL", "Apple Inc.", 19_000, 18_800)),
        "MSFT" => Some(q("MSFT", "Microsoft Corp", 42_000, 41_800)),
        "NVDA" => Some(q("NVDA", "NVIDIA Corp", 100_000, 99_000)),
        "GOOGL" => Some(q("GOOGL", "Alphabet Inc. Class A", 15_000, 14_800)),
        "KO" => Some(q("KO", "Coca-Cola", 6_000, 5_950)),
        "TSLA" => Some(q("TSLA", "Tesla Inc.", 25_000, 24_500)),
        _ => None,
    }
}

fn q(symbol: &str, name: &str, price_cents: i64, prev_cents: i64) -> QuoteFixture {
    QuoteFixture {
        symbol: symbol.to_string(),
        shortname: name.to_string(),
        price: Decimal::new(price_cents, 2),
        previous_close: Decimal::new(prev_cents, 2),
        currency: "USD".to_string(),
    }
}
