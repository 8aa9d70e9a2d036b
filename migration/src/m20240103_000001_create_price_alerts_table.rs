use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(PriceAlerts::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(PriceAlerts::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(PriceAlerts::UserId).integer().not_null())
                .col(ColumnDef::new(PriceAlerts::Symbol).string_len(20).not_null())
                .col(ColumnDef::new(PriceAlerts::TargetPrice).double().not_null())
                .col(ColumnDef::new(PriceAlerts::Direction).string_len(10).not_null()) // "above", "below"
                .col(ColumnDef::new(PriceAlerts::Active).boolean().not_null().default(true))
                .col(ColumnDef::new(PriceAlerts::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(PriceAlerts::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_price_alerts_user_id")
                        .from(PriceAlerts::Table, PriceAlerts::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_price_alerts_user_id")
                .table(PriceAlerts::Table)
                .col(PriceAlerts::UserId)
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_price_alerts_active")
                .table(PriceAlerts::Table)
                .col(PriceAlerts::Active)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PriceAlerts::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PriceAlerts {
    Table,
    Id,
    UserId,
    Symbol,
    TargetPrice,
    Direction,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
