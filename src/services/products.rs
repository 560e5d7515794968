use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        product::Entity as ProductEntity, stock::Entity as StockEntity,
        warehouse::Entity as WarehouseEntity,
    },
    errors::ServiceError,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct WarehouseStockResponse {
    pub warehouse_id: Uuid,
    pub warehouse: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductWithStockResponse {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stocks: Vec<WarehouseStockResponse>,
}

/// Read-only product catalog with per-warehouse stock levels.
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists every product together with its stock level in each warehouse
    /// that holds it.
    #[instrument(skip(self))]
    pub async fn products_with_stock(
        &self,
    ) -> Result<Vec<ProductWithStockResponse>, ServiceError> {
        let db = &*self.db_pool;

        let warehouse_names: HashMap<Uuid, String> = WarehouseEntity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();

        let products = ProductEntity::find()
            .find_with_related(StockEntity)
            .all(db)
            .await?;

        Ok(products
            .into_iter()
            .map(|(product, stocks)| ProductWithStockResponse {
                id: product.id,
                name: product.name,
                price: product.price,
                stocks: stocks
                    .into_iter()
                    .map(|stock| WarehouseStockResponse {
                        warehouse_id: stock.warehouse_id,
                        warehouse: warehouse_names
                            .get(&stock.warehouse_id)
                            .cloned()
                            .unwrap_or_default(),
                        quantity: stock.quantity,
                    })
                    .collect(),
            })
            .collect())
    }
}
