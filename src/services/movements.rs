use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::product_movement::{self, Entity as ProductMovementEntity},
    errors::ServiceError,
};

/// Filters for the movement journal listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovementResponse {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub delta: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MovementListResponse {
    pub movements: Vec<MovementResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Read-only view over the movement journal. All writes happen through the
/// ledger primitives; this service only filters and paginates history.
#[derive(Clone)]
pub struct MovementService {
    db_pool: Arc<DbPool>,
}

impl MovementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists movements filtered by product, warehouse, and date range,
    /// newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
    ) -> Result<MovementListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = filter.page.unwrap_or(1).max(1);
        let per_page = filter.per_page.unwrap_or(15).clamp(1, 100);

        let mut query = ProductMovementEntity::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(product_movement::Column::ProductId.eq(product_id));
        }
        if let Some(warehouse_id) = filter.warehouse_id {
            query = query.filter(product_movement::Column::WarehouseId.eq(warehouse_id));
        }
        if let Some(from) = filter.from_date {
            let from = from.and_time(NaiveTime::MIN).and_utc();
            query = query.filter(product_movement::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to_date {
            let to = to.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::days(1);
            query = query.filter(product_movement::Column::CreatedAt.lt(to));
        }

        let paginator = query
            .order_by_desc(product_movement::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let movements = paginator.fetch_page(page - 1).await?;

        Ok(MovementListResponse {
            movements: movements
                .into_iter()
                .map(|m| MovementResponse {
                    id: m.id,
                    order_id: m.order_id,
                    product_id: m.product_id,
                    warehouse_id: m.warehouse_id,
                    delta: m.delta,
                    reason: m.reason,
                    created_at: m.created_at,
                })
                .collect(),
            total,
            page,
            per_page,
        })
    }
}
