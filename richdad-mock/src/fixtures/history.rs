use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::CandleFixture;

/// Daily candles for a symbol, oldest first.
pub fn by_symbol(s: &str) -> Option<Vec<CandleFixture>> {
    match s {
        "AAPL" => Some(build(&[
            ((2023, 1, 2), 140, 142, 139, 141, 10_000_000),
            ((2023, 1, 3), 141, 143, 140, 142, 11_000_000),
            ((2023, 1, 4), 142, 144, 141, 143, 10_500_000),
        ])),
        "MSFT" => Some(build(&[
            ((2023, 1, 2), 240, 245, 238, 244, 9_000_000),
            ((2023, 1, 3), 244, 246, 243, 245, 9_500_000),
        ])),
        "TSLA" => Some(build(&[
            ((2023, 1, 2), 300, 310, 295, 305, 8_000_000),
            ((2023, 1, 3), 305, 315, 300, 312, 8_500_000),
        ])),
        _ => None,
    }
}

type Row = ((i32, u32, u32), i64, i64, i64, i64, u64);

fn build(rows: &[Row]) -> Vec<CandleFixture> {
    rows.iter()
        .filter_map(|&((y, m, d), o, h, l, c, v)| {
            let ts: DateTime<Utc> = NaiveDate::from_ymd_opt(y, m, d)?
                .and_hms_opt(0, 0, 0)?
                .and_utc();
            Some(CandleFixture {
                ts,
                open: Decimal::from(o),
                high: Decimal::from(h),
                low: Decimal::from(l),
                close: Decimal::from(c),
                volume: v,
            })
        })
        .collect()
}
