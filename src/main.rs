use std::sync::Arc;

use portfolio_tracker::{
    api::{ build_router, AppState },
    crypto::TokenSigner,
    providers::AlphaVantageProvider,
    services::MarketDataService,
    AppError,
    Config,
    Result,
};
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber
        ::registry()
        .with(
            tracing_subscriber::EnvFilter
                ::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_tracker=debug,tower_http=debug".into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| AppError::Config(e.to_string()))?;

    // Connect and run migrations
    let db = portfolio_tracker::db::connect(&config.database_url).await?;
    tracing::info!("Database connected and migrated");

    let provider = AlphaVantageProvider::new(
        config.alpha_vantage_base_url.clone(),
        config.alpha_vantage_api_key.clone(),
        config.upstream_timeout
    )?;
    if config.alpha_vantage_api_key.is_none() {
        tracing::warn!("ALPHA_VANTAGE_API_KEY is not set; market data requests will fail");
    }
    let market_data = Arc::new(MarketDataService::new(Arc::new(provider), &config.cache_ttls));

    let signer = TokenSigner::new(&config.jwt_secret, chrono::Duration::hours(config.jwt_ttl_hours));
    let app = build_router(AppState::new(db, signer, market_data));

    // Start server
    let addr = config.bind_addr();
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener
        ::bind(&addr).await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    axum::serve(listener, app).await.map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
