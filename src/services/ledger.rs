//! Ledger primitives: the stock table and the movement journal.
//!
//! Everything here participates in the caller's transaction and never
//! commits independently. The exclusive row lock on a stock row is the only
//! concurrency primitive; operations touching the same (product, warehouse)
//! pair serialize on it, disjoint pairs proceed concurrently.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    QueryFilter, QuerySelect, Select, Set,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        product_movement::{self, Entity as ProductMovementEntity, MovementReason},
        stock::{self, Entity as StockEntity},
    },
    errors::ServiceError,
};

/// SQLite rejects `FOR UPDATE`; its single-writer transaction model already
/// serializes the check-and-update, so the lock clause is only added on
/// backends that support row locks.
fn with_row_lock<E: EntityTrait>(select: Select<E>, backend: DbBackend) -> Select<E> {
    match backend {
        DbBackend::Sqlite => select,
        _ => select.lock_exclusive(),
    }
}

async fn lock_stock_row(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<Option<stock::Model>, ServiceError> {
    let select = StockEntity::find()
        .filter(stock::Column::ProductId.eq(product_id))
        .filter(stock::Column::WarehouseId.eq(warehouse_id));
    Ok(with_row_lock(select, txn.get_database_backend())
        .one(txn)
        .await?)
}

/// Current quantity on hand for a (product, warehouse) pair; 0 if no stock
/// row exists yet. Read-only, usable outside a transaction.
pub async fn stock_on_hand<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    warehouse_id: Uuid,
) -> Result<i32, ServiceError> {
    let row = StockEntity::find()
        .filter(stock::Column::ProductId.eq(product_id))
        .filter(stock::Column::WarehouseId.eq(warehouse_id))
        .one(conn)
        .await?;
    Ok(row.map(|s| s.quantity).unwrap_or(0))
}

/// Applies a signed delta to an already-locked stock row.
async fn apply_stock_delta(
    txn: &DatabaseTransaction,
    row: stock::Model,
    delta: i32,
) -> Result<stock::Model, ServiceError> {
    let new_quantity = row.quantity.checked_add(delta).ok_or_else(|| {
        ServiceError::ValidationError("stock adjustment overflows the quantity range".to_string())
    })?;
    let mut active: stock::ActiveModel = row.into();
    active.quantity = Set(new_quantity);
    active.updated_at = Set(Some(Utc::now()));
    Ok(active.update(txn).await?)
}

/// Appends one journal row. Insert-only; fails only on a storage fault.
pub async fn append_movement(
    txn: &DatabaseTransaction,
    order_id: Option<Uuid>,
    product_id: Uuid,
    warehouse_id: Uuid,
    delta: i32,
    reason: &str,
) -> Result<product_movement::Model, ServiceError> {
    let movement = product_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        delta: Set(delta),
        reason: Set(reason.to_string()),
        reverted_at: Set(None),
        created_at: Set(Utc::now()),
    };
    Ok(movement.insert(txn).await?)
}

/// Atomically reserves `quantity` units for an order: checks availability
/// under the row lock, debits the stock row, and journals the debit.
///
/// Insufficient stock is a terminal, caller-visible failure for this
/// attempt; there is no retry loop here.
#[instrument(skip(txn))]
pub async fn reserve(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    product_id: Uuid,
    warehouse_id: Uuid,
    quantity: i32,
    reason: MovementReason,
) -> Result<(), ServiceError> {
    debug_assert!(quantity > 0, "reservation quantity must be positive");

    let row = lock_stock_row(txn, product_id, warehouse_id).await?;
    let row = match row {
        Some(row) if row.quantity >= quantity => row,
        other => {
            return Err(ServiceError::InsufficientStock {
                product_id,
                warehouse_id,
                requested: quantity,
                available: other.map(|s| s.quantity).unwrap_or(0),
            });
        }
    };

    apply_stock_delta(txn, row, -quantity).await?;
    append_movement(
        txn,
        Some(order_id),
        product_id,
        warehouse_id,
        -quantity,
        reason.as_str(),
    )
    .await?;
    Ok(())
}

/// Credits back every un-compensated debit movement of an order, journaling
/// a compensating movement per debit with `new_reason` and stamping the
/// debit's `reverted_at` in the same transaction.
///
/// The set of movements to give back is always re-derived from the journal,
/// never from a cached item list, so the operation stays correct after a
/// partial prior failure. The `reverted_at` marker makes a re-entrant call
/// within the same logical transition a no-op instead of a double credit.
///
/// Returns the debit movements that were compensated.
#[instrument(skip(txn))]
pub async fn revert_movements(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    new_reason: MovementReason,
) -> Result<Vec<product_movement::Model>, ServiceError> {
    let debits = with_row_lock(
        ProductMovementEntity::find()
            .filter(product_movement::Column::OrderId.eq(order_id))
            .filter(product_movement::Column::Delta.lt(0))
            .filter(product_movement::Column::RevertedAt.is_null()),
        txn.get_database_backend(),
    )
    .all(txn)
    .await?;

    let now = Utc::now();
    let mut reverted = Vec::with_capacity(debits.len());

    for movement in debits {
        let row = lock_stock_row(txn, movement.product_id, movement.warehouse_id).await?;
        let row = row.ok_or_else(|| {
            error!(
                order_id = %order_id,
                product_id = %movement.product_id,
                warehouse_id = %movement.warehouse_id,
                "stock row missing while reverting movements"
            );
            ServiceError::CorruptLedger {
                product_id: movement.product_id,
                warehouse_id: movement.warehouse_id,
            }
        })?;

        let credit = movement.delta.abs();
        apply_stock_delta(txn, row, credit).await?;
        append_movement(
            txn,
            movement.order_id,
            movement.product_id,
            movement.warehouse_id,
            credit,
            new_reason.as_str(),
        )
        .await?;

        let snapshot = movement.clone();
        let mut consumed: product_movement::ActiveModel = movement.into();
        consumed.reverted_at = Set(Some(now));
        consumed.update(txn).await?;
        reverted.push(snapshot);
    }

    Ok(reverted)
}

/// Applies a non-order stock adjustment (receiving, stock-take correction),
/// creating the stock row lazily on a positive delta. Journals the change
/// with a caller-supplied free-form reason and no order reference.
#[instrument(skip(txn))]
pub async fn adjust_stock(
    txn: &DatabaseTransaction,
    product_id: Uuid,
    warehouse_id: Uuid,
    delta: i32,
    reason: &str,
) -> Result<stock::Model, ServiceError> {
    let row = lock_stock_row(txn, product_id, warehouse_id).await?;
    let updated = match row {
        Some(row) => {
            match row.quantity.checked_add(delta) {
                Some(q) if q < 0 => {
                    return Err(ServiceError::InsufficientStock {
                        product_id,
                        warehouse_id,
                        requested: delta.saturating_abs(),
                        available: row.quantity,
                    });
                }
                Some(_) => {}
                None => {
                    return Err(ServiceError::ValidationError(
                        "stock adjustment overflows the quantity range".to_string(),
                    ));
                }
            }
            apply_stock_delta(txn, row, delta).await?
        }
        None => {
            if delta < 0 {
                return Err(ServiceError::InsufficientStock {
                    product_id,
                    warehouse_id,
                    requested: delta.saturating_abs(),
                    available: 0,
                });
            }
            let stock_row = stock::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                warehouse_id: Set(warehouse_id),
                quantity: Set(delta),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            };
            stock_row.insert(txn).await?
        }
    };

    append_movement(txn, None, product_id, warehouse_id, delta, reason).await?;
    Ok(updated)
}
