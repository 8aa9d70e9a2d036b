use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::TtlCache;
use crate::config::CacheTtls;
use crate::enums::MarketEndpoint;
use crate::error::{ AppError, Result };
use crate::providers::{
    CompanyOverview,
    DailyBar,
    MarketDataProvider,
    NewsArticle,
    NewsQuery,
    Quote,
};

const PROBE_SYMBOL: &str = "IBM";

/// Outcome of a live provider request made for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProviderStatus {
    Online,
    Error(String),
    NotConfigured,
}

impl ProviderStatus {
    pub fn label(&self) -> String {
        match self {
            ProviderStatus::Online => "online".to_string(),
            ProviderStatus::Error(message) => format!("error: {}", message),
            ProviderStatus::NotConfigured => "not_configured".to_string(),
        }
    }
}

/// Read-through cache in front of a [`MarketDataProvider`].
pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    quotes: TtlCache<Quote>,
    overviews: TtlCache<CompanyOverview>,
    news: TtlCache<Vec<NewsArticle>>,
    history: TtlCache<Vec<DailyBar>>,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, ttls: &CacheTtls) -> Self {
        Self {
            provider,
            quotes: TtlCache::new(ttls.quote),
            overviews: TtlCache::new(ttls.overview),
            news: TtlCache::new(ttls.news),
            history: TtlCache::new(ttls.history),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn fetch_price(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;
        let provider = self.provider.clone();
        cached_fetch(MarketEndpoint::Quote, &self.quotes, symbol.clone(), async move {
            provider.fetch_quote(&symbol).await
        }).await
    }

    pub async fn fetch_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let symbol = normalize_symbol(symbol)?;
        let provider = self.provider.clone();
        cached_fetch(MarketEndpoint::Overview, &self.overviews, symbol.clone(), async move {
            provider.fetch_overview(&symbol).await
        }).await
    }

    pub async fn fetch_news(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>> {
        let provider = self.provider.clone();
        let query_owned = query.clone();
        cached_fetch(MarketEndpoint::News, &self.news, query.cache_key(), async move {
            provider.fetch_news(&query_owned).await
        }).await
    }

    pub async fn fetch_history(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let symbol = normalize_symbol(symbol)?;
        let provider = self.provider.clone();
        cached_fetch(MarketEndpoint::History, &self.history, symbol.clone(), async move {
            provider.fetch_history(&symbol).await
        }).await
    }

    /// Live, uncached request used to report provider health.
    pub async fn probe(&self) -> ProviderStatus {
        if !self.provider.is_configured() {
            return ProviderStatus::NotConfigured;
        }

        match self.provider.fetch_quote(PROBE_SYMBOL).await {
            Ok(_) => ProviderStatus::Online,
            Err(e) => {
                tracing::warn!("{} probe failed: {}", self.provider.name(), e);
                ProviderStatus::Error(e.to_string())
            }
        }
    }
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::validation("symbol", "Symbol is required"));
    }
    Ok(symbol)
}

async fn cached_fetch<V, F>(
    endpoint: MarketEndpoint,
    cache: &TtlCache<V>,
    key: String,
    fetch: F
) -> Result<V>
    where V: Clone, F: Future<Output = Result<V>>
{
    if let Some(value) = cache.get_fresh(&key).await {
        tracing::debug!("Cache hit for {} {}", endpoint, key);
        return Ok(value);
    }

    tracing::debug!("Cache miss for {} {}", endpoint, key);
    match fetch.await {
        Ok(value) => {
            cache.insert(key, value.clone()).await;
            Ok(value)
        }
        Err(e) => {
            // A concurrent request may have refreshed the key while this one was in flight
            if let Some(cached) = cache.get_fresh(&key).await {
                tracing::warn!("Serving cached {} for {} after upstream error: {}", endpoint, key, e);
                return Ok(cached);
            }
            tracing::warn!("Upstream {} request for {} failed: {}", endpoint, key, e);
            Err(e)
        }
    }
}
