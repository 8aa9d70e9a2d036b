use std::env;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://portfolio.db?mode=rwc";
const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const MIN_JWT_SECRET_LEN: usize = 16;

/// Time-to-live for each market-data endpoint's cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub quote: Duration,
    pub overview: Duration,
    pub news: Duration,
    pub history: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(300),
            overview: Duration::from_secs(86_400),
            news: Duration::from_secs(1_800),
            history: Duration::from_secs(3_600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub alpha_vantage_api_key: Option<String>,
    pub alpha_vantage_base_url: String,
    pub upstream_timeout: Duration,
    pub cache_ttls: CacheTtls,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(
                format!("JWT_SECRET must be at least {} bytes", MIN_JWT_SECRET_LEN).into()
            );
        }

        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()?;

        // An empty key is treated the same as an absent one
        let alpha_vantage_api_key = env::var("ALPHA_VANTAGE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let alpha_vantage_base_url = env::var("ALPHA_VANTAGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_ALPHA_VANTAGE_URL.to_string());

        let upstream_timeout = Duration::from_secs(Self::parse_secs("UPSTREAM_TIMEOUT_SECS", 10)?);

        let defaults = CacheTtls::default();
        let cache_ttls = CacheTtls {
            quote: Duration::from_secs(
                Self::parse_secs("QUOTE_CACHE_SECS", defaults.quote.as_secs())?
            ),
            overview: Duration::from_secs(
                Self::parse_secs("OVERVIEW_CACHE_SECS", defaults.overview.as_secs())?
            ),
            news: Duration::from_secs(
                Self::parse_secs("NEWS_CACHE_SECS", defaults.news.as_secs())?
            ),
            history: Duration::from_secs(
                Self::parse_secs("HISTORY_CACHE_SECS", defaults.history.as_secs())?
            ),
        };

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            alpha_vantage_api_key,
            alpha_vantage_base_url,
            upstream_timeout,
            cache_ttls,
            server_host,
            server_port,
        })
    }

    fn parse_secs(key: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
        match env::var(key) {
            Ok(value) =>
                Ok(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| format!("{} must be a whole number of seconds", key))?
                ),
            Err(_) => Ok(default),
        }
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
