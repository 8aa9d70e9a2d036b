use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Dividends::Table)
                .if_not_exists()
                .col(
                    ColumnDef::new(Dividends::Id)
                        .integer()
                        .not_null()
                        .auto_increment()
                        .primary_key()
                )
                .col(ColumnDef::new(Dividends::UserId).integer().not_null())
                .col(ColumnDef::new(Dividends::HoldingId).integer().not_null())
                .col(ColumnDef::new(Dividends::Amount).double().not_null())
                .col(ColumnDef::new(Dividends::PayDate).date().not_null())
                .col(ColumnDef::new(Dividends::CreatedAt).timestamp_with_time_zone().not_null())
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_dividends_user_id")
                        .from(Dividends::Table, Dividends::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_dividends_holding_id")
                        .from(Dividends::Table, Dividends::HoldingId)
                        .to(Holdings::Table, Holdings::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_index(
            Index::create()
                .if_not_exists()
                .name("idx_dividends_holding_id")
                .table(Dividends::Table)
                .col(Dividends::HoldingId)
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Dividends::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Dividends {
    Table,
    Id,
    UserId,
    HoldingId,
    Amount,
    PayDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Holdings {
    Table,
    Id,
}
