use chrono::{ DateTime, Utc };
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
use crate::db::entity::{ holding, Holding };

/// A validated holding ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewHolding {
    pub user_id: i32,
    pub symbol: String,
    pub shares: f64,
    pub purchase_price: f64,
    pub purchase_date: DateTime<Utc>,
    pub sector: Option<String>,
}

/// Validated field changes; `None` leaves a column untouched.
/// `sector: Some(None)` clears the sector.
#[derive(Debug, Clone, Default)]
pub struct HoldingChanges {
    pub shares: Option<f64>,
    pub purchase_price: Option<f64>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub sector: Option<Option<String>>,
}

impl HoldingChanges {
    pub fn is_empty(&self) -> bool {
        self.shares.is_none() &&
            self.purchase_price.is_none() &&
            self.purchase_date.is_none() &&
            self.sector.is_none()
    }
}

pub struct HoldingRepository {
    db: DatabaseConnection,
}

impl HoldingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new_holding: NewHolding) -> Result<holding::Model> {
        let now = Utc::now();
        let holding_model = holding::ActiveModel {
            user_id: Set(new_holding.user_id),
            symbol: Set(new_holding.symbol),
            shares: Set(new_holding.shares),
            purchase_price: Set(new_holding.purchase_price),
            purchase_date: Set(new_holding.purchase_date),
            sector: Set(new_holding.sector),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let holding = holding_model.insert(&self.db).await?;
        Ok(holding)
    }

    /// Look up a holding owned by `user_id`. Holdings of other users are
    /// reported exactly like missing ones.
    pub async fn find_for_user(&self, user_id: i32, id: i32) -> Result<holding::Model> {
        Holding::find_by_id(id)
            .filter(holding::Column::UserId.eq(user_id))
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Holding not found".to_string()))
    }

    pub async fn list_for_user(
        &self,
        user_id: i32,
        search: Option<&str>,
        first_letter: Option<char>
    ) -> Result<Vec<holding::Model>> {
        let mut query = Holding::find().filter(holding::Column::UserId.eq(user_id));

        // Symbols are stored upper-cased
        if let Some(term) = search {
            query = query.filter(holding::Column::Symbol.contains(term.to_uppercase()));
        }
        if let Some(letter) = first_letter {
            query = query.filter(
                holding::Column::Symbol.starts_with(letter.to_ascii_uppercase().to_string())
            );
        }

        let holdings = query
            .order_by_asc(holding::Column::Symbol)
            .order_by_asc(holding::Column::Id)
            .all(&self.db).await?;

        Ok(holdings)
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        changes: HoldingChanges
    ) -> Result<holding::Model> {
        let existing = self.find_for_user(user_id, id).await?;

        let mut holding_model: holding::ActiveModel = existing.into();
        if let Some(shares) = changes.shares {
            holding_model.shares = Set(shares);
        }
        if let Some(purchase_price) = changes.purchase_price {
            holding_model.purchase_price = Set(purchase_price);
        }
        if let Some(purchase_date) = changes.purchase_date {
            holding_model.purchase_date = Set(purchase_date);
        }
        if let Some(sector) = changes.sector {
            holding_model.sector = Set(sector);
        }
        holding_model.updated_at = Set(Utc::now());

        let updated = holding_model.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete_for_user(&self, user_id: i32, id: i32) -> Result<()> {
        let result = Holding::delete_many()
            .filter(holding::Column::Id.eq(id))
            .filter(holding::Column::UserId.eq(user_id))
            .exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Holding not found".to_string()));
        }

        Ok(())
    }
}
