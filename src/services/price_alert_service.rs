use crate::db::entity::price_alert;
use crate::enums::AlertDirection;
use crate::error::{ AppError, Result };
use crate::services::portfolio_service::validate_symbol;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue,
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    QueryFilter,
    QueryOrder,
};
use serde::Deserialize;

#[derive(Clone)]
pub struct PriceAlertService {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertRequest {
    pub symbol: String,
    pub target_price: f64,
    #[serde(default)]
    pub direction: Option<String>,
}

impl PriceAlertService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new active price alert. Direction defaults to `above`.
    pub async fn create_alert(
        &self,
        user_id: i32,
        req: CreateAlertRequest
    ) -> Result<price_alert::Model> {
        let symbol = validate_symbol(&req.symbol)?;
        if !req.target_price.is_finite() || req.target_price <= 0.0 {
            return Err(AppError::validation("target_price", "Target price must be greater than 0"));
        }
        let direction = match req.direction.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<AlertDirection>()?,
            _ => AlertDirection::default(),
        };

        let now = Utc::now();
        let alert = price_alert::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            symbol: ActiveValue::Set(symbol),
            target_price: ActiveValue::Set(req.target_price),
            direction: ActiveValue::Set(direction.to_string()),
            active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        let alert = alert.insert(&self.db).await?;
        tracing::info!(
            "User {} created alert {} for {} {} {}",
            user_id,
            alert.id,
            alert.symbol,
            alert.direction,
            alert.target_price
        );
        Ok(alert)
    }

    /// List a user's alerts, newest first
    pub async fn list_user_alerts(
        &self,
        user_id: i32,
        include_inactive: bool
    ) -> Result<Vec<price_alert::Model>> {
        let mut query = price_alert::Entity::find().filter(price_alert::Column::UserId.eq(user_id));

        if !include_inactive {
            query = query.filter(price_alert::Column::Active.eq(true));
        }

        let alerts = query
            .order_by_desc(price_alert::Column::CreatedAt)
            .order_by_desc(price_alert::Column::Id)
            .all(&self.db).await?;
        Ok(alerts)
    }

    pub async fn get_alert(&self, user_id: i32, id: i32) -> Result<price_alert::Model> {
        price_alert::Entity
            ::find_by_id(id)
            .filter(price_alert::Column::UserId.eq(user_id))
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("Alert not found".to_string()))
    }

    /// Activate or deactivate an alert
    pub async fn set_active(&self, user_id: i32, id: i32, active: bool) -> Result<price_alert::Model> {
        let alert = self.get_alert(user_id, id).await?;

        let mut model: price_alert::ActiveModel = alert.into();
        model.active = ActiveValue::Set(active);
        model.updated_at = ActiveValue::Set(Utc::now());

        Ok(model.update(&self.db).await?)
    }

    pub async fn delete_alert(&self, user_id: i32, id: i32) -> Result<()> {
        let result = price_alert::Entity
            ::delete_many()
            .filter(price_alert::Column::Id.eq(id))
            .filter(price_alert::Column::UserId.eq(user_id))
            .exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Alert not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepository;
    use crate::test_support::memory_db;

    async fn setup() -> (PriceAlertService, i32, i32) {
        let db = memory_db().await;
        let users = UserRepository::new(db.clone());
        let alice = users.create("alice".into(), "a@example.com".into(), "x".into()).await.unwrap();
        let bob = users.create("bob".into(), "b@example.com".into(), "x".into()).await.unwrap();
        (PriceAlertService::new(db), alice.id, bob.id)
    }

    fn request(symbol: &str, target: f64, direction: Option<&str>) -> CreateAlertRequest {
        CreateAlertRequest {
            symbol: symbol.to_string(),
            target_price: target,
            direction: direction.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_above() {
        let (service, alice, _) = setup().await;

        let alert = service.create_alert(alice, request("tsla", 250.0, None)).await.unwrap();
        assert_eq!(alert.symbol, "TSLA");
        assert_eq!(alert.direction, "above");
        assert!(alert.active);

        let below = service.create_alert(alice, request("TSLA", 150.0, Some("BELOW"))).await.unwrap();
        assert_eq!(below.direction, "below");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (service, alice, _) = setup().await;

        assert!(service.create_alert(alice, request("TSLA", 0.0, None)).await.is_err());
        assert!(service.create_alert(alice, request("TSLA", 10.0, Some("sideways"))).await.is_err());
        assert!(service.create_alert(alice, request("", 10.0, None)).await.is_err());
    }

    #[tokio::test]
    async fn test_deactivated_alerts_hidden_by_default() {
        let (service, alice, _) = setup().await;
        let first = service.create_alert(alice, request("AAPL", 200.0, None)).await.unwrap();
        let second = service.create_alert(alice, request("MSFT", 500.0, None)).await.unwrap();

        let updated = service.set_active(alice, first.id, false).await.unwrap();
        assert!(!updated.active);

        let active = service.list_user_alerts(alice, false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        let all = service.list_user_alerts(alice, true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
    }

    #[tokio::test]
    async fn test_alerts_scoped_to_owner() {
        let (service, alice, bob) = setup().await;
        let alert = service.create_alert(alice, request("AAPL", 200.0, None)).await.unwrap();

        assert!(matches!(service.set_active(bob, alert.id, false).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.delete_alert(bob, alert.id).await, Err(AppError::NotFound(_))));
        assert!(service.list_user_alerts(bob, true).await.unwrap().is_empty());

        service.delete_alert(alice, alert.id).await.unwrap();
        assert!(matches!(service.get_alert(alice, alert.id).await, Err(AppError::NotFound(_))));
    }
}
