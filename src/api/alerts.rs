use axum::{ extract::{ Path, Query, State }, http::StatusCode, Json };
use serde::Deserialize;

use crate::db::entity::price_alert;
use crate::error::Result;
use crate::services::price_alert_service::CreateAlertRequest;

use super::{ AppState, AuthUser };

#[derive(Deserialize)]
pub struct ListAlertsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Deserialize)]
pub struct UpdateAlertRequest {
    pub active: bool,
}

pub async fn list_alerts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListAlertsQuery>
) -> Result<Json<Vec<price_alert::Model>>> {
    let alerts = state.alert_service.list_user_alerts(user.id(), query.include_inactive).await?;

    Ok(Json(alerts))
}

pub async fn create_alert(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateAlertRequest>
) -> Result<(StatusCode, Json<price_alert::Model>)> {
    let alert = state.alert_service.create_alert(user.id(), request).await?;

    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn update_alert(
    State(state): State<AppState>,
    user: AuthUser,
    Path(alert_id): Path<i32>,
    Json(request): Json<UpdateAlertRequest>
) -> Result<Json<price_alert::Model>> {
    let alert = state.alert_service.set_active(user.id(), alert_id, request.active).await?;

    Ok(Json(alert))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    user: AuthUser,
    Path(alert_id): Path<i32>
) -> Result<StatusCode> {
    state.alert_service.delete_alert(user.id(), alert_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
