//! Historical portfolio value compared against a benchmark index.

use std::collections::{ BTreeMap, BTreeSet, HashMap };

use chrono::{ Months, NaiveDate };
use serde::Serialize;

use crate::db::entity::holding;
use crate::enums::PerformancePeriod;
use crate::providers::DailyBar;
use crate::services::valuation::round2;

pub const BENCHMARK_SYMBOL: &str = "SPY";

/// Longest window `ALL` will reach back.
const MAX_LOOKBACK_MONTHS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub period: PerformancePeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub benchmark_symbol: String,
    pub portfolio_history: Vec<PerformancePoint>,
    pub benchmark_history: Vec<PerformancePoint>,
    pub portfolio_return_pct: Option<f64>,
    pub benchmark_return_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_error: Option<String>,
}

/// First day of the window ending at `end`. `ALL` starts at the earliest
/// purchase, capped at five years back.
pub fn window_start(period: PerformancePeriod, end: NaiveDate, earliest_purchase: Option<NaiveDate>) -> NaiveDate {
    let months_back = |months: u32| end.checked_sub_months(Months::new(months)).unwrap_or(end);

    match period {
        PerformancePeriod::OneMonth => months_back(1),
        PerformancePeriod::SixMonths => months_back(6),
        PerformancePeriod::OneYear => months_back(12),
        PerformancePeriod::All => {
            earliest_purchase.unwrap_or(end).min(end).max(months_back(MAX_LOOKBACK_MONTHS))
        }
    }
}

/// Daily portfolio value on every trading date any held symbol has a bar
/// for. A holding counts from its purchase date, priced at the latest
/// close on or before each date.
pub fn portfolio_series(
    holdings: &[holding::Model],
    histories: &HashMap<String, Vec<DailyBar>>,
    start: NaiveDate,
    end: NaiveDate
) -> Vec<PerformancePoint> {
    let closes: HashMap<&str, BTreeMap<NaiveDate, f64>> = histories
        .iter()
        .map(|(symbol, bars)| {
            (symbol.as_str(), bars.iter().map(|bar| (bar.date, bar.close)).collect())
        })
        .collect();

    let dates: BTreeSet<NaiveDate> = histories
        .values()
        .flatten()
        .map(|bar| bar.date)
        .filter(|date| (start..=end).contains(date))
        .collect();

    dates
        .into_iter()
        .map(|date| {
            let value: f64 = holdings
                .iter()
                .filter(|h| h.purchase_date.date_naive() <= date)
                .filter_map(|h| {
                    let (_, close) = closes.get(h.symbol.as_str())?.range(..=date).next_back()?;
                    Some(h.shares * close)
                })
                .sum();
            PerformancePoint { date, value: round2(value) }
        })
        .collect()
}

/// Benchmark closes inside the window, oldest first.
pub fn benchmark_series(bars: &[DailyBar], start: NaiveDate, end: NaiveDate) -> Vec<PerformancePoint> {
    let mut points: Vec<PerformancePoint> = bars
        .iter()
        .filter(|bar| (start..=end).contains(&bar.date))
        .map(|bar| PerformancePoint { date: bar.date, value: bar.close })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

/// Percent change from the first non-zero point to the last one.
pub fn series_return_pct(series: &[PerformancePoint]) -> Option<f64> {
    let first = series.iter().find(|p| p.value > 0.0)?;
    let last = series.last()?;
    if first.date == last.date {
        return None;
    }
    Some(round2((last.value / first.value - 1.0) * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{ TimeZone, Utc };

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn bar(d: u32, close: f64) -> DailyBar {
        DailyBar { date: day(d), open: close, high: close, low: close, close, volume: 0 }
    }

    fn holding(symbol: &str, shares: f64, bought: u32) -> holding::Model {
        let purchase_date = Utc.with_ymd_and_hms(2024, 5, bought, 15, 30, 0).unwrap();
        holding::Model {
            id: 1,
            user_id: 1,
            symbol: symbol.to_string(),
            shares,
            purchase_price: 1.0,
            purchase_date,
            sector: None,
            created_at: purchase_date,
            updated_at: purchase_date,
        }
    }

    #[test]
    fn test_window_start_per_period() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();

        assert_eq!(
            window_start(PerformancePeriod::OneMonth, end, None),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            window_start(PerformancePeriod::OneYear, end, None),
            NaiveDate::from_ymd_opt(2023, 3, 31).unwrap()
        );

        let bought = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        assert_eq!(window_start(PerformancePeriod::All, end, Some(bought)), bought);

        let long_ago = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert_eq!(
            window_start(PerformancePeriod::All, end, Some(long_ago)),
            NaiveDate::from_ymd_opt(2019, 3, 31).unwrap()
        );
        assert_eq!(window_start(PerformancePeriod::All, end, None), end);
    }

    #[test]
    fn test_portfolio_series_carries_forward_and_respects_purchase_date() {
        let histories = HashMap::from([
            ("AAPL".to_string(), vec![bar(1, 100.0), bar(2, 110.0), bar(3, 120.0)]),
            // No bar on the 2nd
            ("KO".to_string(), vec![bar(1, 60.0), bar(3, 62.0)]),
        ]);
        let holdings = vec![holding("AAPL", 2.0, 1), holding("KO", 10.0, 2)];

        let series = portfolio_series(&holdings, &histories, day(1), day(3));
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();

        // KO only counts from the 2nd, priced at the 1st's close until the 3rd
        assert_eq!(values, vec![200.0, 820.0, 860.0]);
        assert_eq!(series[0].date, day(1));
    }

    #[test]
    fn test_series_clipped_to_window() {
        let bars = vec![bar(3, 510.0), bar(1, 500.0), bar(2, 505.0)];

        let benchmark = benchmark_series(&bars, day(2), day(3));
        assert_eq!(benchmark.len(), 2);
        assert_eq!(benchmark[0].date, day(2));
        assert_eq!(series_return_pct(&benchmark), Some(0.99));
    }

    #[test]
    fn test_return_needs_two_points() {
        assert_eq!(series_return_pct(&[]), None);
        assert_eq!(series_return_pct(&[PerformancePoint { date: day(1), value: 10.0 }]), None);

        let from_zero = vec![
            PerformancePoint { date: day(1), value: 0.0 },
            PerformancePoint { date: day(2), value: 50.0 },
            PerformancePoint { date: day(3), value: 75.0 }
        ];
        assert_eq!(series_return_pct(&from_zero), Some(50.0));
    }
}
