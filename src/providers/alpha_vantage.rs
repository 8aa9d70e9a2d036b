use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ AppError, Result };
use crate::providers::market_data_provider::{
    CompanyOverview,
    DailyBar,
    MarketDataProvider,
    NewsArticle,
    NewsQuery,
    Quote,
};

const DEFAULT_NEWS_TOPICS: &str = "FINANCE,ECONOMY,TECHNOLOGY";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "01. symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close", default)]
    previous_close: Option<String>,
    #[serde(rename = "09. change", default)]
    change: Option<String>,
    #[serde(rename = "10. change percent", default)]
    change_percent: Option<String>,
}

#[derive(Deserialize)]
struct Overview {
    #[serde(rename = "Symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "Industry", default)]
    industry: Option<String>,
    #[serde(rename = "Exchange", default)]
    exchange: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
}

#[derive(Deserialize)]
struct NewsFeedItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    time_published: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    banner_image: Option<String>,
}

#[derive(Deserialize)]
struct TimeSeriesData {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

impl AlphaVantageProvider {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        let api_key = self.api_key
            .as_deref()
            .ok_or_else(|| {
                AppError::UpstreamUnavailable("Alpha Vantage API key is not configured".to_string())
            })?;

        let response = self.client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", api_key)])
            .send().await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Alpha Vantage request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(
                AppError::UpstreamUnavailable(
                    format!("Alpha Vantage returned status: {}", response.status())
                )
            );
        }

        let body: Value = response
            .json().await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("Failed to parse Alpha Vantage response: {}", e))
            })?;

        check_api_notes(&body)?;
        Ok(body)
    }
}

/// Rate-limit notices and API errors arrive as 200 responses with a single
/// explanatory field.
fn check_api_notes(body: &Value) -> Result<()> {
    for key in ["Note", "Information", "Error Message"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return Err(AppError::UpstreamUnavailable(format!("Alpha Vantage: {}", message)));
        }
    }
    Ok(())
}

/// Alpha Vantage reports absent values as empty strings or the literal "None".
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty() && v != "None" && v != "-")
}

fn parse_number(value: Option<String>) -> Option<f64> {
    non_empty(value).and_then(|v| v.trim_end_matches('%').parse().ok())
}

fn parse_quote(symbol: &str, body: Value) -> Result<Quote> {
    let not_found = || AppError::NotFound(format!("No quote available for {}", symbol));

    let quote_value = body.get("Global Quote").cloned().ok_or_else(not_found)?;
    let quote: GlobalQuote = serde_json
        ::from_value(quote_value)
        .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed quote for {}: {}", symbol, e)))?;

    let price = parse_number(quote.price).ok_or_else(not_found)?;

    Ok(Quote {
        symbol: non_empty(quote.symbol).unwrap_or_else(|| symbol.to_string()),
        price,
        previous_close: parse_number(quote.previous_close),
        change: parse_number(quote.change),
        change_percent: parse_number(quote.change_percent),
        latest_trading_day: non_empty(quote.latest_trading_day).and_then(|d|
            NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()
        ),
    })
}

fn parse_overview(symbol: &str, body: Value) -> Result<CompanyOverview> {
    let overview: Overview = serde_json
        ::from_value(body)
        .map_err(|e| {
            AppError::UpstreamUnavailable(format!("Malformed overview for {}: {}", symbol, e))
        })?;

    match non_empty(overview.symbol) {
        Some(returned) if returned.eq_ignore_ascii_case(symbol) =>
            Ok(CompanyOverview {
                symbol: returned,
                name: non_empty(overview.name),
                sector: non_empty(overview.sector),
                industry: non_empty(overview.industry),
                exchange: non_empty(overview.exchange),
                currency: non_empty(overview.currency),
            }),
        _ => Err(AppError::NotFound(format!("No company overview available for {}", symbol))),
    }
}

fn parse_news(body: Value) -> Vec<NewsArticle> {
    let items: Vec<NewsFeedItem> = body
        .get("feed")
        .cloned()
        .and_then(|feed| serde_json::from_value(feed).ok())
        .unwrap_or_default();

    items
        .into_iter()
        .map(|item| NewsArticle {
            title: non_empty(item.title).unwrap_or_else(|| "No Title".to_string()),
            source: non_empty(item.source).unwrap_or_else(|| "Unknown Source".to_string()),
            url: non_empty(item.url).unwrap_or_default(),
            summary: non_empty(item.summary).unwrap_or_default(),
            published_at: non_empty(item.time_published).unwrap_or_default(),
            banner_image: non_empty(item.banner_image),
        })
        .collect()
}

fn parse_history(symbol: &str, body: Value) -> Result<Vec<DailyBar>> {
    let series_value = body
        .get("Time Series (Daily)")
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No price history available for {}", symbol)))?;
    let series: HashMap<String, TimeSeriesData> = serde_json
        ::from_value(series_value)
        .map_err(|e| {
            AppError::UpstreamUnavailable(format!("Malformed history for {}: {}", symbol, e))
        })?;

    let mut bars: Vec<DailyBar> = series
        .into_iter()
        .filter_map(|(date_str, data)| {
            let bar = (|| {
                Some(DailyBar {
                    date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()?,
                    open: data.open.parse().ok()?,
                    high: data.high.parse().ok()?,
                    low: data.low.parse().ok()?,
                    close: data.close.parse().ok()?,
                    volume: data.volume.parse().ok()?,
                })
            })();
            if bar.is_none() {
                tracing::warn!("Skipping unparsable history point for {} on {}", symbol, date_str);
            }
            bar
        })
        .collect();

    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn name(&self) -> &'static str {
        "Alpha Vantage"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let body = self.query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)]).await?;
        parse_quote(symbol, body)
    }

    async fn fetch_overview(&self, symbol: &str) -> Result<CompanyOverview> {
        let body = self.query(&[("function", "OVERVIEW"), ("symbol", symbol)]).await?;
        parse_overview(symbol, body)
    }

    async fn fetch_news(&self, query: &NewsQuery) -> Result<Vec<NewsArticle>> {
        let limit = query.limit.to_string();
        let mut params = vec![("function", "NEWS_SENTIMENT"), ("sort", "LATEST"), ("limit", limit.as_str())];

        let topics = query.topics.join(",").to_uppercase();
        let tickers = query.tickers.join(",").to_uppercase();
        if !topics.is_empty() {
            params.push(("topics", topics.as_str()));
        } else if !tickers.is_empty() {
            params.push(("tickers", tickers.as_str()));
        } else {
            params.push(("topics", DEFAULT_NEWS_TOPICS));
        }

        let body = self.query(&params).await?;
        Ok(parse_news(body))
    }

    async fn fetch_history(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let body = self.query(
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "compact"),
            ]
        ).await?;
        parse_history(symbol, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quote() {
        let body =
            json!({
            "Global Quote": {
                "01. symbol": "IBM",
                "05. price": "187.4200",
                "07. latest trading day": "2024-05-10",
                "08. previous close": "185.0000",
                "09. change": "2.4200",
                "10. change percent": "1.3081%"
            }
        });

        let quote = parse_quote("IBM", body).unwrap();
        assert_eq!(quote.symbol, "IBM");
        assert_eq!(quote.price, 187.42);
        assert_eq!(quote.change_percent, Some(1.3081));
        assert_eq!(quote.latest_trading_day, NaiveDate::from_ymd_opt(2024, 5, 10));
    }

    #[test]
    fn test_empty_quote_is_not_found() {
        let body = json!({ "Global Quote": {} });
        assert!(matches!(parse_quote("NOPE", body), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_rate_limit_note_is_upstream_failure() {
        let body = json!({ "Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day." });
        assert!(matches!(check_api_notes(&body), Err(AppError::UpstreamUnavailable(_))));
        assert!(check_api_notes(&json!({ "Global Quote": {} })).is_ok());
    }

    #[test]
    fn test_parse_overview_normalises_none() {
        let body =
            json!({
            "Symbol": "AAPL",
            "Name": "Apple Inc",
            "Sector": "TECHNOLOGY",
            "Industry": "None",
            "Exchange": "NASDAQ",
            "Currency": "USD"
        });

        let overview = parse_overview("aapl", body).unwrap();
        assert_eq!(overview.sector.as_deref(), Some("TECHNOLOGY"));
        assert_eq!(overview.industry, None);

        assert!(matches!(parse_overview("MSFT", json!({})), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_parse_history_sorted_oldest_first() {
        let body =
            json!({
            "Time Series (Daily)": {
                "2024-05-10": { "1. open": "10", "2. high": "12", "3. low": "9", "4. close": "11", "5. volume": "1000" },
                "2024-05-08": { "1. open": "8", "2. high": "9", "3. low": "7", "4. close": "8.5", "5. volume": "900" },
                "2024-05-09": { "1. open": "x", "2. high": "9", "3. low": "7", "4. close": "8.5", "5. volume": "900" }
            }
        });

        let bars = parse_history("IBM", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
        assert_eq!(bars[1].close, 11.0);
    }

    #[test]
    fn test_parse_news_fills_defaults() {
        let body =
            json!({
            "feed": [
                { "title": "Markets rally", "url": "https://example.com/a", "time_published": "20240510T120000", "summary": "Up", "source": "Wire" },
                { "url": "https://example.com/b" }
            ]
        });

        let articles = parse_news(body);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Markets rally");
        assert_eq!(articles[1].title, "No Title");
        assert_eq!(articles[1].source, "Unknown Source");
        assert!(parse_news(json!({})).is_empty());
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let provider = AlphaVantageProvider::new(
            "http://127.0.0.1:9".to_string(),
            None,
            Duration::from_secs(1)
        ).unwrap();

        assert!(!provider.is_configured());
        assert!(
            matches!(provider.fetch_quote("IBM").await, Err(AppError::UpstreamUnavailable(_)))
        );
    }
}
