use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Holdings::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Holdings::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Holdings::UserId).integer().not_null())
                .col(ColumnDef::new(Holdings::Symbol).string_len(20).not_null())
                .col(ColumnDef::new(Holdings::Shares).double().not_null())
                .col(ColumnDef::new(Holdings::PurchasePrice).double().not_null())
                .col(ColumnDef::new(Holdings::PurchaseDate).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Holdings::Sector).string_len(100))
                .col(ColumnDef::new(Holdings::CreatedAt).timestamp_with_time_zone().not_null())
                .col(ColumnDef::new(Holdings::UpdatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_holdings_user_id")
                        .from(Holdings::Table, Holdings::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_holdings_user_symbol")
                .table(Holdings::Table)
                .col(Holdings::UserId)
                .col(Holdings::Symbol)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Holdings::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Holdings {
    Table,
    Id,
    UserId,
    Symbol,
    Shares,
    PurchasePrice,
    PurchaseDate,
    Sector,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
