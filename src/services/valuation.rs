//! Portfolio value, return and sector allocation from holdings and prices.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::entity::holding;

pub const UNKNOWN_SECTOR: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingValuation {
    pub id: i32,
    pub symbol: String,
    pub shares: f64,
    pub purchase_price: f64,
    pub purchase_date: String,
    pub sector: Option<String>,
    pub current_price: Option<f64>,
    pub current_value: f64,
    pub cost_basis: f64,
    #[serde(rename = "return")]
    pub gain: f64,
    pub return_pct: f64,
    pub total_dividends_received: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub total_value: f64,
    pub total_cost_basis: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub total_dividends_received: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioValuation {
    pub holdings: Vec<HoldingValuation>,
    pub totals: PortfolioTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorAllocation {
    pub sector: String,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub total_value: f64,
    pub sectors: Vec<SectorAllocation>,
}

/// A holding paired with the result of looking up its price.
pub type PricedHolding = (holding::Model, Result<f64, String>);

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { (part / whole) * 100.0 }
}

pub fn value_holding(
    holding: &holding::Model,
    price: Result<f64, String>,
    dividends_received: f64
) -> HoldingValuation {
    let cost_basis = holding.shares * holding.purchase_price;
    let (current_price, current_value, gain, price_error) = match price {
        Ok(price) => {
            let value = holding.shares * price;
            (Some(price), value, value - cost_basis, None)
        }
        Err(message) => (None, 0.0, 0.0, Some(message)),
    };

    HoldingValuation {
        id: holding.id,
        symbol: holding.symbol.clone(),
        shares: holding.shares,
        purchase_price: holding.purchase_price,
        purchase_date: holding.purchase_date.to_rfc3339(),
        sector: holding.sector.clone(),
        current_price,
        current_value: round2(current_value),
        cost_basis: round2(cost_basis),
        gain: round2(gain),
        return_pct: if current_price.is_some() {
            round2(percent_of(gain, cost_basis))
        } else {
            0.0
        },
        total_dividends_received: round2(dividends_received),
        price_error,
    }
}

/// Value each holding and sum the ones that have a price. Dividends are
/// reported alongside the return, not folded into it.
pub fn value_portfolio(
    priced: Vec<PricedHolding>,
    dividends_by_holding: &HashMap<i32, f64>
) -> PortfolioValuation {
    let mut total_value = 0.0;
    let mut total_cost_basis = 0.0;
    let mut total_dividends = 0.0;

    let holdings: Vec<HoldingValuation> = priced
        .into_iter()
        .map(|(holding, price)| {
            if let Ok(p) = &price {
                total_value += holding.shares * p;
                total_cost_basis += holding.shares * holding.purchase_price;
            }
            let dividends = dividends_by_holding.get(&holding.id).copied().unwrap_or(0.0);
            total_dividends += dividends;
            value_holding(&holding, price, dividends)
        })
        .collect();

    let total_return = total_value - total_cost_basis;
    PortfolioValuation {
        holdings,
        totals: PortfolioTotals {
            total_value: round2(total_value),
            total_cost_basis: round2(total_cost_basis),
            total_return: round2(total_return),
            total_return_pct: round2(percent_of(total_return, total_cost_basis)),
            total_dividends_received: round2(total_dividends),
        },
    }
}

/// Group current value by sector, largest first.
pub fn allocate_by_sector(priced: &[PricedHolding]) -> Allocation {
    let mut by_sector: HashMap<String, f64> = HashMap::new();
    let mut total_value = 0.0;

    for (holding, price) in priced {
        let value = match price {
            Ok(p) => holding.shares * p,
            Err(_) => 0.0,
        };
        let sector = holding.sector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_SECTOR)
            .to_string();

        *by_sector.entry(sector).or_insert(0.0) += value;
        total_value += value;
    }

    let mut sectors: Vec<SectorAllocation> = by_sector
        .into_iter()
        .map(|(sector, value)| SectorAllocation {
            percentage: round2(percent_of(value, total_value)),
            value: round2(value),
            sector,
        })
        .collect();
    sectors.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.sector.cmp(&b.sector)));

    Allocation {
        total_value: round2(total_value),
        sectors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn holding(id: i32, symbol: &str, shares: f64, purchase_price: f64, sector: Option<&str>) -> holding::Model {
        holding::Model {
            id,
            user_id: 1,
            symbol: symbol.to_string(),
            shares,
            purchase_price,
            purchase_date: Utc::now(),
            sector: sector.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_holding_value_and_return() {
        let valued = value_holding(&holding(1, "AAPL", 10.0, 100.0, None), Ok(150.0), 0.0);

        assert_eq!(valued.current_value, 1500.0);
        assert_eq!(valued.cost_basis, 1000.0);
        assert_eq!(valued.gain, 500.0);
        assert_eq!(valued.return_pct, 50.0);
    }

    #[test]
    fn test_zero_cost_basis_has_zero_return_pct() {
        let valued = value_holding(&holding(1, "GIFT", 5.0, 0.0, None), Ok(20.0), 0.0);
        assert_eq!(valued.gain, 100.0);
        assert_eq!(valued.return_pct, 0.0);
    }

    #[test]
    fn test_unpriced_holding_excluded_from_totals() {
        let valuation = value_portfolio(
            vec![
                (holding(1, "AAPL", 10.0, 100.0, None), Ok(150.0)),
                (holding(2, "GONE", 3.0, 50.0, None), Err("No quote available".to_string()))
            ],
            &HashMap::new()
        );

        assert_eq!(valuation.totals.total_value, 1500.0);
        assert_eq!(valuation.totals.total_cost_basis, 1000.0);
        assert_eq!(valuation.totals.total_return_pct, 50.0);
        assert_eq!(valuation.holdings[1].current_price, None);
        assert!(valuation.holdings[1].price_error.is_some());
    }

    #[test]
    fn test_dividends_reported_per_holding_and_in_totals() {
        let dividends = HashMap::from([(1, 12.5), (2, 3.333)]);
        let valuation = value_portfolio(
            vec![
                (holding(1, "KO", 10.0, 50.0, None), Ok(60.0)),
                (holding(2, "GONE", 3.0, 50.0, None), Err("No quote available".to_string())),
                (holding(3, "AAPL", 1.0, 100.0, None), Ok(100.0))
            ],
            &dividends
        );

        assert_eq!(valuation.holdings[0].total_dividends_received, 12.5);
        assert_eq!(valuation.holdings[1].total_dividends_received, 3.33);
        assert_eq!(valuation.holdings[2].total_dividends_received, 0.0);
        assert_eq!(valuation.totals.total_dividends_received, 15.83);
        // Return excludes dividends
        assert_eq!(valuation.totals.total_return, 100.0);
    }

    #[test]
    fn test_allocation_groups_and_sorts() {
        let priced: Vec<PricedHolding> = vec![
            (holding(1, "AAPL", 10.0, 1.0, Some("Technology")), Ok(100.0)),
            (holding(2, "MSFT", 5.0, 1.0, Some("Technology")), Ok(100.0)),
            (holding(3, "XOM", 10.0, 1.0, Some("Energy")), Ok(50.0)),
            (holding(4, "ZZZ", 1.0, 1.0, None), Ok(500.0))
        ];

        let allocation = allocate_by_sector(&priced);
        assert_eq!(allocation.total_value, 2500.0);

        let names: Vec<&str> = allocation.sectors
            .iter()
            .map(|s| s.sector.as_str())
            .collect();
        assert_eq!(names, vec!["Technology", "Energy", "Unknown"]);
        assert_eq!(allocation.sectors[0].percentage, 60.0);
        assert_eq!(allocation.sectors[1].percentage, 20.0);
    }

    #[test]
    fn test_empty_allocation() {
        let allocation = allocate_by_sector(&[]);
        assert_eq!(allocation.total_value, 0.0);
        assert!(allocation.sectors.is_empty());
    }
}
