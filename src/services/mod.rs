pub mod auth_service;
pub mod market_data_service;
pub mod valuation;
pub mod performance;
pub mod portfolio_service;
pub mod price_alert_service;
pub mod dividend_service;
pub mod import_service;
pub mod admin_service;

pub use auth_service::AuthService;
pub use market_data_service::MarketDataService;
pub use portfolio_service::PortfolioService;
pub use price_alert_service::PriceAlertService;
pub use dividend_service::DividendService;
pub use import_service::ImportService;
pub use admin_service::AdminService;
