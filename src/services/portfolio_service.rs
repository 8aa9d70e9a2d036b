use std::collections::HashMap;
use std::sync::Arc;

use chrono::{ DateTime, NaiveDate, NaiveDateTime, Utc };
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::db::{ entity::holding, DividendRepository, HoldingChanges, HoldingRepository, NewHolding };
use crate::enums::PerformancePeriod;
use crate::error::{ AppError, Result };
use crate::providers::DailyBar;
use crate::services::market_data_service::MarketDataService;
use crate::services::performance::{
    benchmark_series,
    portfolio_series,
    series_return_pct,
    window_start,
    Performance,
    BENCHMARK_SYMBOL,
};
use crate::services::valuation::{
    allocate_by_sector,
    value_portfolio,
    Allocation,
    PortfolioValuation,
    PricedHolding,
};

const SYMBOL_MAX: usize = 20;
const SECTOR_MAX: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct AddHoldingRequest {
    pub symbol: String,
    pub shares: f64,
    pub purchase_price: f64,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

/// Partial update; absent fields are left untouched and an empty
/// `sector` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHoldingRequest {
    #[serde(default)]
    pub shares: Option<f64>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

pub struct PortfolioService {
    holdings: HoldingRepository,
    dividends: DividendRepository,
    market_data: Arc<MarketDataService>,
}

impl PortfolioService {
    pub fn new(db: DatabaseConnection, market_data: Arc<MarketDataService>) -> Self {
        Self {
            holdings: HoldingRepository::new(db.clone()),
            dividends: DividendRepository::new(db),
            market_data,
        }
    }

    pub async fn list_holdings(
        &self,
        user_id: i32,
        search: Option<&str>,
        filter_by_letter: Option<&str>
    ) -> Result<Vec<holding::Model>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        // Only a single alphabetic character is a usable prefix
        let letter = filter_by_letter.and_then(|raw| {
            let mut chars = raw.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
                _ => None,
            }
        });

        self.holdings.list_for_user(user_id, search, letter).await
    }

    pub async fn get_holding(&self, user_id: i32, id: i32) -> Result<holding::Model> {
        self.holdings.find_for_user(user_id, id).await
    }

    pub async fn add_holding(&self, user_id: i32, req: AddHoldingRequest) -> Result<holding::Model> {
        let symbol = validate_symbol(&req.symbol)?;
        validate_shares(req.shares)?;
        validate_purchase_price(req.purchase_price)?;

        let purchase_date = match req.purchase_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_purchase_date(raw)?,
            _ => Utc::now(),
        };

        let sector = match normalize_sector(req.sector)? {
            Some(sector) => Some(sector),
            None => self.lookup_sector(&symbol).await,
        };

        let created = self.holdings.create(NewHolding {
            user_id,
            symbol,
            shares: req.shares,
            purchase_price: req.purchase_price,
            purchase_date,
            sector,
        }).await?;

        tracing::info!("User {} added holding {} ({})", user_id, created.id, created.symbol);
        Ok(created)
    }

    pub async fn update_holding(
        &self,
        user_id: i32,
        id: i32,
        req: UpdateHoldingRequest
    ) -> Result<holding::Model> {
        let mut changes = HoldingChanges::default();

        if let Some(shares) = req.shares {
            validate_shares(shares)?;
            changes.shares = Some(shares);
        }
        if let Some(price) = req.purchase_price {
            validate_purchase_price(price)?;
            changes.purchase_price = Some(price);
        }
        if let Some(raw) = req.purchase_date {
            changes.purchase_date = Some(parse_purchase_date(raw.trim())?);
        }
        if req.sector.is_some() {
            changes.sector = Some(normalize_sector(req.sector)?);
        }

        if changes.is_empty() {
            return Err(AppError::Validation {
                field: None,
                message: "No fields to update".to_string(),
            });
        }

        self.holdings.update(user_id, id, changes).await
    }

    pub async fn delete_holding(&self, user_id: i32, id: i32) -> Result<()> {
        self.holdings.delete_for_user(user_id, id).await?;
        tracing::info!("User {} deleted holding {}", user_id, id);
        Ok(())
    }

    /// Current value and return of every holding plus portfolio totals.
    pub async fn valued_portfolio(&self, user_id: i32) -> Result<PortfolioValuation> {
        let priced = self.priced_holdings(user_id).await?;
        let dividends = self.dividends.totals_by_holding(user_id).await?;
        Ok(value_portfolio(priced, &dividends))
    }

    pub async fn allocation(&self, user_id: i32) -> Result<Allocation> {
        let priced = self.priced_holdings(user_id).await?;
        Ok(allocate_by_sector(&priced))
    }

    /// Daily portfolio value over `period` next to the benchmark's closes.
    /// A symbol whose history cannot be fetched is left out of the series.
    pub async fn performance(&self, user_id: i32, period: PerformancePeriod) -> Result<Performance> {
        let holdings = self.holdings.list_for_user(user_id, None, None).await?;

        let end = Utc::now().date_naive();
        let earliest = holdings
            .iter()
            .map(|h| h.purchase_date.date_naive())
            .min();
        let start = window_start(period, end, earliest);

        let mut histories: HashMap<String, Vec<DailyBar>> = HashMap::new();
        for holding in &holdings {
            if histories.contains_key(&holding.symbol) {
                continue;
            }
            match self.market_data.fetch_history(&holding.symbol).await {
                Ok(bars) => {
                    histories.insert(holding.symbol.clone(), bars);
                }
                Err(e) => {
                    tracing::warn!("No history for {} in performance of user {}: {}", holding.symbol, user_id, e);
                }
            }
        }

        let (benchmark_history, benchmark_error) = if holdings.is_empty() {
            (Vec::new(), None)
        } else {
            match self.market_data.fetch_history(BENCHMARK_SYMBOL).await {
                Ok(bars) => (benchmark_series(&bars, start, end), None),
                Err(e) => {
                    tracing::warn!("Benchmark {} history unavailable: {}", BENCHMARK_SYMBOL, e);
                    (Vec::new(), Some(e.to_string()))
                }
            }
        };

        let portfolio_history = portfolio_series(&holdings, &histories, start, end);

        Ok(Performance {
            period,
            start_date: start,
            end_date: end,
            benchmark_symbol: BENCHMARK_SYMBOL.to_string(),
            portfolio_return_pct: series_return_pct(&portfolio_history),
            benchmark_return_pct: series_return_pct(&benchmark_history),
            portfolio_history,
            benchmark_history,
            benchmark_error,
        })
    }

    async fn priced_holdings(&self, user_id: i32) -> Result<Vec<PricedHolding>> {
        let holdings = self.holdings.list_for_user(user_id, None, None).await?;

        // One lookup per distinct symbol
        let mut prices: HashMap<String, std::result::Result<f64, String>> = HashMap::new();
        for holding in &holdings {
            if !prices.contains_key(&holding.symbol) {
                let price = self.market_data
                    .fetch_price(&holding.symbol).await
                    .map(|quote| quote.price)
                    .map_err(|e| e.to_string());
                prices.insert(holding.symbol.clone(), price);
            }
        }

        Ok(
            holdings
                .into_iter()
                .map(|holding| {
                    let price = prices
                        .get(&holding.symbol)
                        .cloned()
                        .unwrap_or_else(|| Err("Price unavailable".to_string()));
                    (holding, price)
                })
                .collect()
        )
    }

    async fn lookup_sector(&self, symbol: &str) -> Option<String> {
        match self.market_data.fetch_overview(symbol).await {
            Ok(overview) => overview.sector,
            Err(e) => {
                tracing::debug!("No sector found for {}: {}", symbol, e);
                None
            }
        }
    }
}

/// Trim and upper-case a ticker symbol.
pub fn validate_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() || symbol.chars().count() > SYMBOL_MAX {
        return Err(
            AppError::validation(
                "symbol",
                format!("Symbol must be between 1 and {} characters", SYMBOL_MAX)
            )
        );
    }
    Ok(symbol)
}

fn validate_shares(shares: f64) -> Result<()> {
    if !shares.is_finite() || shares <= 0.0 {
        return Err(AppError::validation("shares", "Shares must be greater than 0"));
    }
    Ok(())
}

fn validate_purchase_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("purchase_price", "Purchase price cannot be negative"));
    }
    Ok(())
}

fn normalize_sector(sector: Option<String>) -> Result<Option<String>> {
    match sector.map(|s| s.trim().to_string()) {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) if s.chars().count() > SECTOR_MAX => {
            Err(
                AppError::validation(
                    "sector",
                    format!("Sector must be at most {} characters", SECTOR_MAX)
                )
            )
        }
        other => Ok(other),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`, all read as UTC.
pub fn parse_purchase_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(dt.and_utc());
    }

    Err(
        AppError::validation(
            "purchase_date",
            format!("Invalid date '{}'. Use YYYY-MM-DD or an ISO 8601 timestamp", raw)
        )
    )
}
