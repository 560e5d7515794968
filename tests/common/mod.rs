#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use migrations::{Migrator, MigratorTrait};
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use warehouse_api::entities::order::{self, OrderStatus};
use warehouse_api::entities::{product, product_movement, stock, warehouse};
use warehouse_api::services::ledger;
use warehouse_api::services::orders::OrderService;

/// Fresh in-memory database with the full schema applied.
///
/// A single connection is forced so every handle in the test sees the same
/// in-memory database.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    Arc::new(db)
}

pub fn order_service(db: &Arc<DatabaseConnection>) -> OrderService {
    OrderService::new(db.clone(), None)
}

pub async fn seed_warehouse(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    warehouse::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("failed to seed warehouse");
    id
}

pub async fn seed_product(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        price: Set(dec!(9.99)),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("failed to seed product");
    id
}

pub async fn seed_stock(
    db: &DatabaseConnection,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i32,
) {
    stock::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("failed to seed stock");
}

/// Bare active order row, bypassing the service layer. For exercising the
/// ledger primitives directly.
pub async fn seed_order(db: &DatabaseConnection, warehouse_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    order::ActiveModel {
        id: Set(id),
        customer: Set("Acme".to_string()),
        warehouse_id: Set(warehouse_id),
        status: Set(OrderStatus::Active),
        created_at: Set(Utc::now()),
        completed_at: Set(None),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("failed to seed order");
    id
}

pub async fn stock_quantity(db: &DatabaseConnection, product_id: Uuid, warehouse_id: Uuid) -> i32 {
    ledger::stock_on_hand(db, product_id, warehouse_id)
        .await
        .expect("failed to read stock")
}

pub async fn movements_for_order(
    db: &DatabaseConnection,
    order_id: Uuid,
) -> Vec<product_movement::Model> {
    product_movement::Entity::find()
        .filter(product_movement::Column::OrderId.eq(order_id))
        .order_by_asc(product_movement::Column::CreatedAt)
        .all(db)
        .await
        .expect("failed to read movements")
}

/// Movements of an order reduced to (product, delta, reason) for assertions
/// that do not care about insertion order.
pub async fn movement_summary(
    db: &DatabaseConnection,
    order_id: Uuid,
) -> Vec<(Uuid, i32, String)> {
    let mut rows: Vec<_> = movements_for_order(db, order_id)
        .await
        .into_iter()
        .map(|m| (m.product_id, m.delta, m.reason))
        .collect();
    rows.sort();
    rows
}
