use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stocks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Stocks::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Stocks::ProductId).uuid().not_null())
                    .col(ColumnDef::new(Stocks::WarehouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(Stocks::Quantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Stocks::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Stocks::UpdatedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stocks_product_id")
                            .from(Stocks::Table, Stocks::ProductId)
                            .to(
                                super::m20240301_000002_create_products_table::Products::Table,
                                super::m20240301_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stocks_warehouse_id")
                            .from(Stocks::Table, Stocks::WarehouseId)
                            .to(
                                super::m20240301_000001_create_warehouses_table::Warehouses::Table,
                                super::m20240301_000001_create_warehouses_table::Warehouses::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One stock row per (product, warehouse) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_stocks_product_warehouse")
                    .table(Stocks::Table)
                    .col(Stocks::ProductId)
                    .col(Stocks::WarehouseId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stocks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Stocks {
    Table,
    Id,
    ProductId,
    WarehouseId,
    Quantity,
    CreatedAt,
    UpdatedAt,
}
