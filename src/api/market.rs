use axum::{ extract::{ Path, Query, State }, Json };
use serde::{ Deserialize, Serialize };

use crate::error::Result;
use crate::providers::{ CompanyOverview, DailyBar, NewsArticle, NewsQuery, Quote };

use super::{ AppState, AuthUser };

#[derive(Deserialize)]
pub struct NewsParams {
    #[serde(default)]
    pub topics: Option<String>,
    #[serde(default)]
    pub tickers: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub bars: Vec<DailyBar>,
}

#[derive(Serialize)]
pub struct NewsResponse {
    pub articles: Vec<NewsArticle>,
    pub count: usize,
}

pub async fn get_quote(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(symbol): Path<String>
) -> Result<Json<Quote>> {
    let quote = state.market_data.fetch_price(&symbol).await?;

    Ok(Json(quote))
}

pub async fn get_overview(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(symbol): Path<String>
) -> Result<Json<CompanyOverview>> {
    let overview = state.market_data.fetch_overview(&symbol).await?;

    Ok(Json(overview))
}

pub async fn get_history(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(symbol): Path<String>
) -> Result<Json<HistoryResponse>> {
    let bars = state.market_data.fetch_history(&symbol).await?;

    Ok(
        Json(HistoryResponse {
            symbol: symbol.trim().to_uppercase(),
            bars,
        })
    )
}

/// Public news feed.
pub async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<NewsParams>
) -> Result<Json<NewsResponse>> {
    let query = NewsQuery::from_params(
        params.topics.as_deref(),
        params.tickers.as_deref(),
        params.limit
    );
    let articles = state.market_data.fetch_news(&query).await?;

    Ok(
        Json(NewsResponse {
            count: articles.len(),
            articles,
        })
    )
}
