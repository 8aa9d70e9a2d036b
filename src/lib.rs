pub mod config;
pub mod enums;
pub mod error;
pub mod cache;
pub mod crypto;
pub mod db;
pub mod providers;
pub mod services;
pub mod api;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use enums::{ AlertDirection, MarketEndpoint, PerformancePeriod };
pub use error::{ AppError, Result };
