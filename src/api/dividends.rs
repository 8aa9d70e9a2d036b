use axum::{ extract::{ Path, State }, http::StatusCode, Json };

use crate::db::entity::dividend;
use crate::error::Result;
use crate::services::dividend_service::{ RecordDividendRequest, UpdateDividendRequest };

use super::{ AppState, AuthUser };

pub async fn list_dividends(
    State(state): State<AppState>,
    user: AuthUser,
    Path(holding_id): Path<i32>
) -> Result<Json<Vec<dividend::Model>>> {
    let dividends = state.dividend_service.list_for_holding(user.id(), holding_id).await?;

    Ok(Json(dividends))
}

pub async fn record_dividend(
    State(state): State<AppState>,
    user: AuthUser,
    Path(holding_id): Path<i32>,
    Json(request): Json<RecordDividendRequest>
) -> Result<(StatusCode, Json<dividend::Model>)> {
    let dividend = state.dividend_service.record_dividend(user.id(), holding_id, request).await?;

    Ok((StatusCode::CREATED, Json(dividend)))
}

pub async fn update_dividend(
    State(state): State<AppState>,
    user: AuthUser,
    Path(dividend_id): Path<i32>,
    Json(request): Json<UpdateDividendRequest>
) -> Result<Json<dividend::Model>> {
    let dividend = state.dividend_service.update_dividend(user.id(), dividend_id, request).await?;

    Ok(Json(dividend))
}

pub async fn delete_dividend(
    State(state): State<AppState>,
    user: AuthUser,
    Path(dividend_id): Path<i32>
) -> Result<StatusCode> {
    state.dividend_service.delete_dividend(user.id(), dividend_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
