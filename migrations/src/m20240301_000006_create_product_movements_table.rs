use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductMovements::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductMovements::OrderId).uuid().null())
                    .col(ColumnDef::new(ProductMovements::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductMovements::WarehouseId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductMovements::Delta).integer().not_null())
                    .col(ColumnDef::new(ProductMovements::Reason).string().not_null())
                    .col(
                        ColumnDef::new(ProductMovements::RevertedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_movements_order_id")
                            .from(ProductMovements::Table, ProductMovements::OrderId)
                            .to(
                                super::m20240301_000004_create_orders_table::Orders::Table,
                                super::m20240301_000004_create_orders_table::Orders::Id,
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_movements_product_id")
                            .from(ProductMovements::Table, ProductMovements::ProductId)
                            .to(
                                super::m20240301_000002_create_products_table::Products::Table,
                                super::m20240301_000002_create_products_table::Products::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_movements_warehouse_id")
                            .from(ProductMovements::Table, ProductMovements::WarehouseId)
                            .to(
                                super::m20240301_000001_create_warehouses_table::Warehouses::Table,
                                super::m20240301_000001_create_warehouses_table::Warehouses::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_movements_order_id")
                    .table(ProductMovements::Table)
                    .col(ProductMovements::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_movements_product_warehouse")
                    .table(ProductMovements::Table)
                    .col(ProductMovements::ProductId)
                    .col(ProductMovements::WarehouseId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductMovements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProductMovements {
    Table,
    Id,
    OrderId,
    ProductId,
    WarehouseId,
    Delta,
    Reason,
    RevertedAt,
    CreatedAt,
}
