use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::db::entity::dividend;
use crate::db::{ DividendRepository, HoldingRepository, NewDividend };
use crate::error::{ AppError, Result };

#[derive(Debug, Clone, Deserialize)]
pub struct RecordDividendRequest {
    pub amount: f64,
    pub pay_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDividendRequest {
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub pay_date: Option<String>,
}

/// Dividend payments recorded against a user's own holdings.
pub struct DividendService {
    holdings: HoldingRepository,
    dividends: DividendRepository,
}

impl DividendService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            holdings: HoldingRepository::new(db.clone()),
            dividends: DividendRepository::new(db),
        }
    }

    pub async fn record_dividend(
        &self,
        user_id: i32,
        holding_id: i32,
        req: RecordDividendRequest
    ) -> Result<dividend::Model> {
        let holding = self.holdings.find_for_user(user_id, holding_id).await?;
        validate_amount(req.amount)?;
        let pay_date = parse_pay_date(&req.pay_date)?;

        let created = self.dividends.create(NewDividend {
            user_id,
            holding_id: holding.id,
            amount: req.amount,
            pay_date,
        }).await?;

        tracing::info!(
            "User {} recorded dividend {} of {} on {}",
            user_id,
            created.id,
            created.amount,
            holding.symbol
        );
        Ok(created)
    }

    pub async fn list_for_holding(&self, user_id: i32, holding_id: i32) -> Result<Vec<dividend::Model>> {
        self.holdings.find_for_user(user_id, holding_id).await?;
        self.dividends.list_for_holding(user_id, holding_id).await
    }

    pub async fn update_dividend(
        &self,
        user_id: i32,
        id: i32,
        req: UpdateDividendRequest
    ) -> Result<dividend::Model> {
        if let Some(amount) = req.amount {
            validate_amount(amount)?;
        }
        let pay_date = req.pay_date.as_deref().map(parse_pay_date).transpose()?;

        if req.amount.is_none() && pay_date.is_none() {
            return Err(AppError::Validation {
                field: None,
                message: "No fields to update".to_string(),
            });
        }

        self.dividends.update(user_id, id, req.amount, pay_date).await
    }

    pub async fn delete_dividend(&self, user_id: i32, id: i32) -> Result<()> {
        self.dividends.delete_for_user(user_id, id).await?;
        tracing::info!("User {} deleted dividend {}", user_id, id);
        Ok(())
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("amount", "Amount must be greater than 0"));
    }
    Ok(())
}

fn parse_pay_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::validation("pay_date", format!("Invalid date '{}'. Use YYYY-MM-DD", raw))
    })
}
