use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{ header, request::Parts, HeaderValue },
    routing::{ get, post, put },
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::{ cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer };

pub mod auth;
pub mod holdings;
pub mod portfolio;
pub mod alerts;
pub mod dividends;
pub mod market;
pub mod admin;


use crate::crypto::TokenSigner;
use crate::db::entity::user;
use crate::error::AppError;
use crate::services::{
    auth_service::ADMIN_USER_ID,
    AdminService,
    AuthService,
    DividendService,
    ImportService,
    MarketDataService,
    PortfolioService,
    PriceAlertService,
};

const ACCESS_TOKEN_HEADER: &str = "x-access-token";

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub portfolio_service: Arc<PortfolioService>,
    pub alert_service: Arc<PriceAlertService>,
    pub dividend_service: Arc<DividendService>,
    pub import_service: Arc<ImportService>,
    pub admin_service: Arc<AdminService>,
    pub market_data: Arc<MarketDataService>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        signer: TokenSigner,
        market_data: Arc<MarketDataService>
    ) -> Self {
        let portfolio_service = Arc::new(PortfolioService::new(db.clone(), market_data.clone()));

        Self {
            auth_service: Arc::new(AuthService::new(db.clone(), signer)),
            import_service: Arc::new(ImportService::new(portfolio_service.clone())),
            portfolio_service,
            alert_service: Arc::new(PriceAlertService::new(db.clone())),
            dividend_service: Arc::new(DividendService::new(db.clone())),
            admin_service: Arc::new(AdminService::new(db, market_data.clone())),
            market_data,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/holdings", get(holdings::list_holdings).post(holdings::create_holding))
        .route(
            "/api/holdings/{id}",
            get(holdings::get_holding)
                .put(holdings::update_holding)
                .delete(holdings::delete_holding)
        )
        .route(
            "/api/holdings/{id}/dividends",
            get(dividends::list_dividends).post(dividends::record_dividend)
        )
        .route(
            "/api/dividends/{id}",
            put(dividends::update_dividend).delete(dividends::delete_dividend)
        )
        .route("/api/portfolio", get(portfolio::get_portfolio))
        .route("/api/portfolio/allocation", get(portfolio::get_allocation))
        .route("/api/portfolio/performance", get(portfolio::get_performance))
        .route("/api/portfolio/import", post(portfolio::import_csv))
        .route("/api/alerts", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/api/alerts/{id}", put(alerts::update_alert).delete(alerts::delete_alert))
        .route("/api/market/quote/{symbol}", get(market::get_quote))
        .route("/api/market/overview/{symbol}", get(market::get_overview))
        .route("/api/market/history/{symbol}", get(market::get_history))
        .route("/api/news", get(market::get_news))
        .route("/api/admin/stats/users", get(admin::user_stats))
        .route("/api/admin/stats/system", get(admin::system_status))
        .route("/api/admin/users", get(admin::list_users))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(
            SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff")
            )
        )
        .layer(
            SetResponseHeaderLayer::overriding(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"))
        )
        .layer(
            SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin")
            )
        )
}

async fn health_check() -> &'static str {
    "OK"
}

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Missing authentication token".to_string())
        })?;

        let user = state.auth_service.verify(&token).await?;
        Ok(AuthUser(user))
    }
}

/// An authenticated caller who is also the administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if user.id != ADMIN_USER_ID {
            tracing::warn!("User {} attempted to access an admin endpoint", user.id);
            return Err(AppError::Forbidden("Administrator access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

/// `Authorization: Bearer <token>`, falling back to `x-access-token`.
fn bearer_token(parts: &Parts) -> Option<String> {
    let from_authorization = parts.headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let from_access_header = || {
        parts.headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    };

    from_authorization.or_else(from_access_header).map(str::to_string)
}
