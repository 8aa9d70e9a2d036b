use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── AlertDirection ─────────────────────────────────────────────────

/// Side of the target price an alert is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    #[default]
    Above,
    Below,
}

impl AlertDirection {
    /// Canonical string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDirection::Above => "above",
            AlertDirection::Below => "below",
        }
    }
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(AlertDirection::Above),
            "below" => Ok(AlertDirection::Below),
            _ =>
                Err(
                    AppError::validation(
                        "direction",
                        format!("Invalid direction: {}. Supported: above, below", s)
                    )
                ),
        }
    }
}

// ─── MarketEndpoint ─────────────────────────────────────────────────

/// Upstream endpoint a cached market datum came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketEndpoint {
    Quote,
    Overview,
    News,
    History,
}

impl MarketEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketEndpoint::Quote => "quote",
            MarketEndpoint::Overview => "overview",
            MarketEndpoint::News => "news",
            MarketEndpoint::History => "history",
        }
    }
}

impl fmt::Display for MarketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── PerformancePeriod ──────────────────────────────────────────────

/// Look-back window for the performance comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PerformancePeriod {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl PerformancePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformancePeriod::OneMonth => "1M",
            PerformancePeriod::SixMonths => "6M",
            PerformancePeriod::OneYear => "1Y",
            PerformancePeriod::All => "ALL",
        }
    }
}

impl fmt::Display for PerformancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformancePeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1M" => Ok(PerformancePeriod::OneMonth),
            "6M" => Ok(PerformancePeriod::SixMonths),
            "1Y" => Ok(PerformancePeriod::OneYear),
            "ALL" => Ok(PerformancePeriod::All),
            _ =>
                Err(
                    AppError::validation(
                        "period",
                        format!("Invalid period: {}. Supported: 1M, 6M, 1Y, ALL", s)
                    )
                ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing_is_case_insensitive() {
        assert_eq!("ABOVE".parse::<AlertDirection>().unwrap(), AlertDirection::Above);
        assert_eq!(" below ".parse::<AlertDirection>().unwrap(), AlertDirection::Below);
        assert!("sideways".parse::<AlertDirection>().is_err());
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("1m".parse::<PerformancePeriod>().unwrap(), PerformancePeriod::OneMonth);
        assert_eq!("ALL".parse::<PerformancePeriod>().unwrap(), PerformancePeriod::All);
        assert_eq!(PerformancePeriod::default().to_string(), "1Y");

        match "5Y".parse::<PerformancePeriod>() {
            Err(AppError::Validation { field: Some(field), .. }) => assert_eq!(field, "period"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
