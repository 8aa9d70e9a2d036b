use axum::{ extract::{ Query, State }, Json };
use serde::Deserialize;

use crate::error::Result;
use crate::services::admin_service::{ SystemStatus, UserPage, UserStats };

use super::{ AdminUser, AppState };

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

pub async fn user_stats(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<UserStats>> {
    let stats = state.admin_service.user_stats().await?;

    Ok(Json(stats))
}

pub async fn system_status(
    State(state): State<AppState>,
    _admin: AdminUser
) -> Json<SystemStatus> {
    Json(state.admin_service.system_status().await)
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<PageParams>
) -> Result<Json<UserPage>> {
    let page = state.admin_service.list_users(params.page, params.per_page).await?;

    Ok(Json(page))
}
