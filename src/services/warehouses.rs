use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::warehouse::{self, Entity as WarehouseEntity},
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1, message = "Warehouse name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WarehouseResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Warehouse reference data. Warehouses are immutable after creation.
#[derive(Clone)]
pub struct WarehouseService {
    db_pool: Arc<DbPool>,
}

impl WarehouseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_warehouse(
        &self,
        request: CreateWarehouseRequest,
    ) -> Result<WarehouseResponse, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let model = warehouse::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(warehouse_id = %model.id, "warehouse created");
        Ok(Self::to_response(model))
    }

    #[instrument(skip(self))]
    pub async fn list_warehouses(&self) -> Result<Vec<WarehouseResponse>, ServiceError> {
        let db = &*self.db_pool;
        let warehouses = WarehouseEntity::find()
            .order_by_asc(warehouse::Column::Name)
            .all(db)
            .await?;
        Ok(warehouses.into_iter().map(Self::to_response).collect())
    }

    fn to_response(model: warehouse::Model) -> WarehouseResponse {
        WarehouseResponse {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        }
    }
}
