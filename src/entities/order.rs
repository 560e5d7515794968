use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Closed set of order states. The only mutation path for an order's status
/// is through the transition methods below; handlers and services never
/// assign the column directly.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Active => "active",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Active -> Completed. Completed is terminal.
    pub fn completed(self) -> Result<OrderStatus, ServiceError> {
        match self {
            OrderStatus::Active => Ok(OrderStatus::Completed),
            other => Err(ServiceError::illegal_transition(other, "complete")),
        }
    }

    /// Active -> Cancelled.
    pub fn cancelled(self) -> Result<OrderStatus, ServiceError> {
        match self {
            OrderStatus::Active => Ok(OrderStatus::Cancelled),
            other => Err(ServiceError::illegal_transition(other, "cancel")),
        }
    }

    /// Cancelled -> Active.
    pub fn resumed(self) -> Result<OrderStatus, ServiceError> {
        match self {
            OrderStatus::Cancelled => Ok(OrderStatus::Active),
            other => Err(ServiceError::illegal_transition(other, "resume")),
        }
    }

    /// Line items may only be replaced while the order is active.
    pub fn updatable(self) -> Result<OrderStatus, ServiceError> {
        match self {
            OrderStatus::Active => Ok(OrderStatus::Active),
            other => Err(ServiceError::illegal_transition(other, "update")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer: String,
    pub warehouse_id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::product_movement::Entity")]
    ProductMovements,
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::product_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductMovements.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
