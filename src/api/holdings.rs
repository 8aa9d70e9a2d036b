use axum::{ extract::{ Path, Query, State }, http::StatusCode, Json };
use serde::Deserialize;

use crate::db::entity::holding;
use crate::error::Result;
use crate::services::portfolio_service::{ AddHoldingRequest, UpdateHoldingRequest };

use super::{ AppState, AuthUser };

#[derive(Deserialize)]
pub struct ListHoldingsQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub filter_by_letter: Option<String>,
}

pub async fn list_holdings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListHoldingsQuery>
) -> Result<Json<Vec<holding::Model>>> {
    let holdings = state.portfolio_service.list_holdings(
        user.id(),
        query.search.as_deref(),
        query.filter_by_letter.as_deref()
    ).await?;

    Ok(Json(holdings))
}

pub async fn create_holding(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AddHoldingRequest>
) -> Result<(StatusCode, Json<holding::Model>)> {
    let holding = state.portfolio_service.add_holding(user.id(), request).await?;

    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn get_holding(
    State(state): State<AppState>,
    user: AuthUser,
    Path(holding_id): Path<i32>
) -> Result<Json<holding::Model>> {
    let holding = state.portfolio_service.get_holding(user.id(), holding_id).await?;

    Ok(Json(holding))
}

pub async fn update_holding(
    State(state): State<AppState>,
    user: AuthUser,
    Path(holding_id): Path<i32>,
    Json(request): Json<UpdateHoldingRequest>
) -> Result<Json<holding::Model>> {
    let holding = state.portfolio_service.update_holding(user.id(), holding_id, request).await?;

    Ok(Json(holding))
}

pub async fn delete_holding(
    State(state): State<AppState>,
    user: AuthUser,
    Path(holding_id): Path<i32>
) -> Result<StatusCode> {
    state.portfolio_service.delete_holding(user.id(), holding_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
