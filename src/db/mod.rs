use migration::MigratorTrait;
use sea_orm::{
    entity::prelude::*,
    ConnectOptions,
    Database,
    DatabaseConnection,
    PaginatorTrait,
    QueryOrder,
    Set,
};

use crate::error::{ AppError, Result };

pub mod entity;
pub use entity::*;

mod holding_repository;
pub use holding_repository::{ HoldingChanges, HoldingRepository, NewHolding };

mod dividend_repository;
pub use dividend_repository::{ DividendRepository, NewDividend };

/// Open the database pool and bring the schema up to date.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);

    // Every connection to an in-memory SQLite database gets its own database
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;

    Ok(db)
}

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        username: String,
        email: String,
        password_hash: String
    ) -> Result<entity::user::Model> {
        let user = entity::user::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let user = user.insert(&self.db).await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<entity::user::Model> {
        entity::user::Entity
            ::find_by_id(id)
            .one(&self.db).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<entity::user::Model>> {
        let user = entity::user::Entity
            ::find()
            .filter(entity::user::Column::Email.eq(email))
            .one(&self.db).await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<entity::user::Model>> {
        let user = entity::user::Entity
            ::find()
            .filter(entity::user::Column::Username.eq(username))
            .one(&self.db).await?;

        Ok(user)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(entity::user::Entity::find().count(&self.db).await?)
    }

    /// One page of users ordered by id. `page` is 1-based.
    pub async fn list_page(&self, page: u64, per_page: u64) -> Result<Vec<entity::user::Model>> {
        let users = entity::user::Entity
            ::find()
            .order_by_asc(entity::user::Column::Id)
            .paginate(&self.db, per_page)
            .fetch_page(page.saturating_sub(1)).await?;

        Ok(users)
    }
}
