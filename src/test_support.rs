use std::collections::HashMap;
use std::sync::atomic::{ AtomicBool, AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };

use async_trait::async_trait;
use chrono::{ Days, Utc };
use sea_orm::DatabaseConnection;

use crate::config::CacheTtls;
use crate::db;
use crate::error::{ AppError, Result };
use crate::providers::{
    CompanyOverview,
    DailyBar,
    MarketDataProvider,
    NewsArticle,
    NewsQuery,
    Quote,
};
use crate::services::MarketDataService;

pub async fn memory_db() -> DatabaseConnection {
    db::connect("sqlite::memory:").await.expect("in-memory database")
}

/// In-process market data with switchable failure.
#[derive(Default)]
pub struct StubProvider {
    prices: Mutex<HashMap<String, f64>>,
    sectors: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
    unconfigured: AtomicBool,
    quote_calls: AtomicUsize,
    overview_calls: AtomicUsize,
    news_calls: AtomicUsize,
}

impl StubProvider {
    pub fn with_prices(prices: &[(&str, f64)]) -> Self {
        let stub = Self::default();
        for (symbol, price) in prices {
            stub.set_price(symbol, *price);
        }
        stub
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    pub fn set_sector(&self, symbol: &str, sector: &str) {
        self.sectors.lock().unwrap().insert(symbol.to_string(), sector.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_configured(&self, configured: bool) {
        self.unconfigured.store(!configured, Ordering::SeqCst);
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn overview_calls(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
    }

    pub fn news_calls(&self) -> usize {
        self.news_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamUnavailable("stub provider is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "Stub"
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured.load(Ordering::SeqCst)
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let price = self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No quote available for {}", symbol)))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            previous_close: None,
            change: None,
            change_percent: None,
            latest_trading_day: None,
        })
    }

    async fn fetch_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let sector = self.sectors
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No overview available for {}", symbol)))?;

        Ok(CompanyOverview {
            symbol: symbol.to_string(),
            name: Some(format!("{} Corp", symbol)),
            sector: Some(sector),
            industry: None,
            exchange: Some("NYSE".to_string()),
            currency: Some("USD".to_string()),
        })
    }

    async fn fetch_news(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>> {
        self.news_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        Ok(
            (0..query.limit.min(3))
                .map(|i| NewsArticle {
                    title: format!("Headline {}", i + 1),
                    source: "Stub Wire".to_string(),
                    url: format!("https://news.test/{}", i + 1),
                    summary: String::new(),
                    published_at: "20240510T120000".to_string(),
                    banner_image: None,
                })
                .collect()
        )
    }

    async fn fetch_history(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        self.check_available()?;

        let close = self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No price history available for {}", symbol)))?;

        // The three most recent days, oldest first
        let today = Utc::now().date_naive();
        Ok(
            (0..3)
                .rev()
                .filter_map(|days_back| {
                    Some(DailyBar {
                        date: today.checked_sub_days(Days::new(days_back))?,
                        open: close,
                        high: close,
                        low: close,
                        close,
                        volume: 1_000,
                    })
                })
                .collect()
        )
    }
}

pub fn market_data(stub: &Arc<StubProvider>) -> Arc<MarketDataService> {
    Arc::new(MarketDataService::new(stub.clone(), &CacheTtls::default()))
}
