use axum::{ extract::State, http::StatusCode, Json };
use serde::Deserialize;

use crate::error::Result;
use crate::services::auth_service::{ LoginResponse, UserProfile };

use super::{ AppState, AuthUser };

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>
) -> Result<(StatusCode, Json<UserProfile>)> {
    let profile = state.auth_service.register(
        &request.username,
        &request.email,
        &request.password
    ).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>
) -> Result<Json<LoginResponse>> {
    let response = state.auth_service.authenticate(&request.email, &request.password).await?;

    Ok(Json(response))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user.into())
}
