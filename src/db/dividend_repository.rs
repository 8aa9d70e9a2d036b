use std::collections::HashMap;

use chrono::{ NaiveDate, Utc };
use sea_orm::{
    ActiveModelTrait,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    Set,
};

use crate::error::{ AppError, Result };
use crate::db::entity::{ dividend, Dividend };

#[derive(Debug, Clone)]
pub struct NewDividend {
    pub user_id: i32,
    pub holding_id: i32,
    pub amount: f64,
    pub pay_date: NaiveDate,
}

pub struct DividendRepository {
    db: DatabaseConnection,
}

impl DividendRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_dividend: NewDividend) -> Result<dividend::Model> {
        let dividend_model = dividend::ActiveModel {
            user_id: Set(new_dividend.user_id),
            holding_id: Set(new_dividend.holding_id),
            amount: Set(new_dividend.amount),
            pay_date: Set(new_dividend.pay_date),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let dividend = dividend_model.insert(&self.db).await?;
        Ok(dividend)
    }

    pub async fn find_for_user(&self, user_id: i32, id: i32) -> Result<dividend::Model> {
        Dividend::find_by_id(id)
            .filter(dividend::Column::UserId.eq(user_id))
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Dividend not found".to_string()))
    }

    /// Payments on one holding, most recent first.
    pub async fn list_for_holding(&self, user_id: i32, holding_id: i32) -> Result<Vec<dividend::Model>> {
        let dividends = Dividend::find()
            .filter(dividend::Column::UserId.eq(user_id))
            .filter(dividend::Column::HoldingId.eq(holding_id))
            .order_by_desc(dividend::Column::PayDate)
            .order_by_desc(dividend::Column::Id)
            .all(&self.db).await?;

        Ok(dividends)
    }

    /// Sum of all payments per holding id for one user.
    pub async fn totals_by_holding(&self, user_id: i32) -> Result<HashMap<i32, f64>> {
        let dividends = Dividend::find()
            .filter(dividend::Column::UserId.eq(user_id))
            .all(&self.db).await?;

        let mut totals: HashMap<i32, f64> = HashMap::new();
        for dividend in dividends {
            *totals.entry(dividend.holding_id).or_insert(0.0) += dividend.amount;
        }
        Ok(totals)
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        amount: Option<f64>,
        pay_date: Option<NaiveDate>
    ) -> Result<dividend::Model> {
        let existing = self.find_for_user(user_id, id).await?;

        let mut dividend_model: dividend::ActiveModel = existing.into();
        if let Some(amount) = amount {
            dividend_model.amount = Set(amount);
        }
        if let Some(pay_date) = pay_date {
            dividend_model.pay_date = Set(pay_date);
        }

        let updated = dividend_model.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete_for_user(&self, user_id: i32, id: i32) -> Result<()> {
        let result = Dividend::delete_many()
            .filter(dividend::Column::Id.eq(id))
            .filter(dividend::Column::UserId.eq(user_id))
            .exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Dividend not found".to_string()));
        }

        Ok(())
    }
}
