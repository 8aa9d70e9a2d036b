use axum::{ extract::{ Multipart, Query, State }, Json };
use serde::Deserialize;

use crate::enums::PerformancePeriod;
use crate::error::{ AppError, Result };
use crate::services::import_service::ImportSummary;
use crate::services::performance::Performance;
use crate::services::valuation::{ Allocation, PortfolioValuation };

use super::{ AppState, AuthUser };

const UPLOAD_FIELD: &str = "file";

pub async fn get_portfolio(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<PortfolioValuation>> {
    let valuation = state.portfolio_service.valued_portfolio(user.id()).await?;

    Ok(Json(valuation))
}

pub async fn get_allocation(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<Allocation>> {
    let allocation = state.portfolio_service.allocation(user.id()).await?;

    Ok(Json(allocation))
}

#[derive(Deserialize)]
pub struct PerformanceQuery {
    #[serde(default)]
    pub period: Option<String>,
}

pub async fn get_performance(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PerformanceQuery>
) -> Result<Json<Performance>> {
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<PerformancePeriod>()?,
        None => PerformancePeriod::default(),
    };
    let performance = state.portfolio_service.performance(user.id(), period).await?;

    Ok(Json(performance))
}

/// Bulk-create holdings from a CSV upload in the `file` field.
pub async fn import_csv(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart
) -> Result<Json<ImportSummary>> {
    let upload_error = |e: axum::extract::multipart::MultipartError| {
        AppError::validation(UPLOAD_FIELD, format!("Invalid upload: {}", e))
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        if let Some(file_name) = field.file_name() {
            if !file_name.to_lowercase().ends_with(".csv") {
                return Err(AppError::validation(UPLOAD_FIELD, "Only .csv files are accepted"));
            }
        }

        let data = field.bytes().await.map_err(upload_error)?;
        let summary = state.import_service.import_csv(user.id(), &data).await?;
        return Ok(Json(summary));
    }

    Err(AppError::validation(UPLOAD_FIELD, "No file uploaded"))
}
