pub mod market_data_provider;
pub mod alpha_vantage;

pub use market_data_provider::{
    CompanyOverview,
    DailyBar,
    MarketDataProvider,
    NewsArticle,
    NewsQuery,
    Quote,
};
pub use alpha_vantage::AlphaVantageProvider;
