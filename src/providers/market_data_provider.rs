use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{ Deserialize, Serialize };

use crate::error::Result;

pub const DEFAULT_NEWS_LIMIT: u32 = 10;
pub const MAX_NEWS_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub latest_trading_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub source: String,
    pub url: String,
    pub summary: String,
    pub published_at: String,
    pub banner_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Filter for the news feed. Topics take precedence over tickers upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub topics: Vec<String>,
    pub tickers: Vec<String>,
    pub limit: u32,
}

impl NewsQuery {
    /// Build a query from comma-separated lists, clamping the limit to
    /// `1..=MAX_NEWS_LIMIT`.
    pub fn from_params(topics: Option<&str>, tickers: Option<&str>, limit: Option<u32>) -> Self {
        Self {
            topics: split_list(topics),
            tickers: split_list(tickers),
            limit: limit.unwrap_or(DEFAULT_NEWS_LIMIT).clamp(1, MAX_NEWS_LIMIT),
        }
    }

    /// Order-insensitive key identifying this query in the news cache.
    pub fn cache_key(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        let mut topics: Vec<String> = self.topics
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        topics.sort();
        parts.extend(topics);

        let mut tickers: Vec<String> = self.tickers
            .iter()
            .map(|t| t.to_lowercase())
            .collect();
        tickers.sort();
        parts.extend(tickers);

        if parts.is_empty() {
            parts.push("general_financial_news".to_string());
        }

        format!("{}_limit{}", parts.join("_"), self.limit)
    }
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self::from_params(None, None, None)
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }).unwrap_or_default()
}

/// Source of quotes, company metadata, news and daily history.
///
/// Implementations report transport and rate-limit failures as
/// `AppError::UpstreamUnavailable` and unknown symbols as `AppError::NotFound`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable provider name used in logs and status reports.
    fn name(&self) -> &'static str;

    /// Whether the provider has the credentials it needs to make requests.
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;

    async fn fetch_overview(&self, symbol: &str) -> Result<CompanyOverview>;

    async fn fetch_news(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>>;

    /// Daily bars, oldest first.
    async fn fetch_history(&self, symbol: &str) -> Result<Vec<DailyBar>>;
}
