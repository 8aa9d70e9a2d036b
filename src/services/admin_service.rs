use std::sync::Arc;

use sea_orm::{
    ColumnTrait,
    DatabaseConnection,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QuerySelect,
};
use serde::Serialize;

use crate::db::entity::{ holding, price_alert, Holding, PriceAlert };
use crate::db::UserRepository;
use crate::error::{ AppError, Result };
use crate::services::auth_service::UserProfile;
use crate::services::market_data_service::MarketDataService;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_users: u64,
    pub users_with_holdings: u64,
    pub users_with_active_alerts: u64,
    pub total_holdings: u64,
    pub total_active_alerts: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub database: String,
    pub market_data_provider: String,
    pub provider_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUserSummary {
    #[serde(flatten)]
    pub user: UserProfile,
    pub holdings_count: u64,
    pub alerts_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<AdminUserSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total_users: u64,
    pub total_pages: u64,
}

pub struct AdminService {
    db: DatabaseConnection,
    users: UserRepository,
    market_data: Arc<MarketDataService>,
}

impl AdminService {
    pub fn new(db: DatabaseConnection, market_data: Arc<MarketDataService>) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            db,
            market_data,
        }
    }

    pub async fn user_stats(&self) -> Result<UserStats> {
        let total_users = self.users.count().await?;

        let holders: Vec<i32> = Holding::find()
            .select_only()
            .column(holding::Column::UserId)
            .distinct()
            .into_tuple()
            .all(&self.db).await?;

        let alert_owners: Vec<i32> = PriceAlert::find()
            .filter(price_alert::Column::Active.eq(true))
            .select_only()
            .column(price_alert::Column::UserId)
            .distinct()
            .into_tuple()
            .all(&self.db).await?;

        let total_holdings = Holding::find().count(&self.db).await?;
        let total_active_alerts = PriceAlert::find()
            .filter(price_alert::Column::Active.eq(true))
            .count(&self.db).await?;

        Ok(UserStats {
            total_users,
            users_with_holdings: holders.len() as u64,
            users_with_active_alerts: alert_owners.len() as u64,
            total_holdings,
            total_active_alerts,
        })
    }

    pub async fn system_status(&self) -> SystemStatus {
        let database = match self.db.ping().await {
            Ok(()) => "online".to_string(),
            Err(e) => {
                tracing::error!("Database ping failed: {}", e);
                format!("error: {}", e)
            }
        };

        SystemStatus {
            database,
            market_data_provider: self.market_data.provider_name().to_string(),
            provider_status: self.market_data.probe().await.label(),
        }
    }

    /// One page of users with their holding and alert counts.
    pub async fn list_users(&self, page: Option<u64>, per_page: Option<u64>) -> Result<UserPage> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page < 1 {
            return Err(AppError::validation("page", "Page must be at least 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(
                AppError::validation(
                    "per_page",
                    format!("per_page must be between 1 and {}", MAX_PER_PAGE)
                )
            );
        }

        let total_users = self.users.count().await?;
        let users = self.users.list_page(page, per_page).await?;

        let mut summaries = Vec::with_capacity(users.len());
        for user in users {
            let holdings_count = Holding::find()
                .filter(holding::Column::UserId.eq(user.id))
                .count(&self.db).await?;
            let alerts_count = PriceAlert::find()
                .filter(price_alert::Column::UserId.eq(user.id))
                .count(&self.db).await?;

            summaries.push(AdminUserSummary {
                user: user.into(),
                holdings_count,
                alerts_count,
            });
        }

        Ok(UserPage {
            users: summaries,
            page,
            per_page,
            total_users,
            total_pages: total_users.div_ceil(per_page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::portfolio_service::{ AddHoldingRequest, PortfolioService };
    use crate::services::price_alert_service::{ CreateAlertRequest, PriceAlertService };
    use crate::test_support::{ market_data, memory_db, StubProvider };

    async fn seeded() -> (AdminService, Arc<StubProvider>) {
        let db = memory_db().await;
        let stub = Arc::new(StubProvider::with_prices(&[("IBM", 187.0)]));
        let users = UserRepository::new(db.clone());
        let mut ids = Vec::new();
        for name in ["admin", "alice", "bob"] {
            let user = users
                .create(name.into(), format!("{}@example.com", name), "x".into()).await
                .unwrap();
            ids.push(user.id);
        }

        let portfolio = PortfolioService::new(db.clone(), market_data(&stub));
        for (user_id, symbol) in [(ids[1], "AAPL"), (ids[1], "MSFT"), (ids[2], "IBM")] {
            portfolio
                .add_holding(user_id, AddHoldingRequest {
                    symbol: symbol.into(),
                    shares: 1.0,
                    purchase_price: 10.0,
                    purchase_date: None,
                    sector: Some("Tech".into()),
                }).await
                .unwrap();
        }

        let alerts = PriceAlertService::new(db.clone());
        let alert = alerts
            .create_alert(ids[2], CreateAlertRequest {
                symbol: "IBM".into(),
                target_price: 200.0,
                direction: None,
            }).await
            .unwrap();
        alerts
            .create_alert(ids[1], CreateAlertRequest {
                symbol: "AAPL".into(),
                target_price: 100.0,
                direction: Some("below".into()),
            }).await
            .unwrap();
        alerts.set_active(ids[2], alert.id, false).await.unwrap();

        (AdminService::new(db, market_data(&stub)), stub)
    }

    #[tokio::test]
    async fn test_user_stats() {
        let (admin, _) = seeded().await;

        let stats = admin.user_stats().await.unwrap();
        assert_eq!(stats, UserStats {
            total_users: 3,
            users_with_holdings: 2,
            users_with_active_alerts: 1,
            total_holdings: 3,
            total_active_alerts: 1,
        });
    }

    #[tokio::test]
    async fn test_list_users_paginates() {
        let (admin, _) = seeded().await;

        let page = admin.list_users(Some(1), Some(2)).await.unwrap();
        assert_eq!(page.total_users, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.users.len(), 2);
        assert_eq!(page.users[1].holdings_count, 2);
        assert_eq!(page.users[1].alerts_count, 1);

        let last = admin.list_users(Some(2), Some(2)).await.unwrap();
        assert_eq!(last.users.len(), 1);
        assert_eq!(last.users[0].user.username, "bob");

        assert!(admin.list_users(Some(0), None).await.is_err());
        assert!(admin.list_users(None, Some(101)).await.is_err());
        assert_eq!(admin.list_users(None, None).await.unwrap().per_page, DEFAULT_PER_PAGE);
    }

    #[tokio::test]
    async fn test_system_status() {
        let (admin, stub) = seeded().await;

        let status = admin.system_status().await;
        assert_eq!(status.database, "online");
        assert_eq!(status.provider_status, "online");

        stub.set_configured(false);
        assert_eq!(admin.system_status().await.provider_status, "not_configured");
    }
}
