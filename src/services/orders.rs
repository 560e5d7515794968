use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        order::{self, Entity as OrderEntity, OrderStatus},
        order_item::{self, Entity as OrderItemEntity},
        product_movement::{self, MovementReason},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer: String,
    pub warehouse_id: Uuid,
    #[validate]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer: Option<String>,
    #[validate]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub customer: String,
    pub warehouse_id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Filters for the paginated order listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

fn map_txn_err(err: TransactionError<ServiceError>) -> ServiceError {
    match err {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(service_err) => service_err,
    }
}

/// The order lifecycle engine. Every transition runs inside exactly one
/// database transaction spanning all of its sub-steps; a failure at any
/// sub-step rolls the whole transition back, leaving the order and stock
/// exactly as before the call.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new active order, reserving stock for every line item.
    #[instrument(skip(self, request), fields(customer = %request.customer, warehouse_id = %request.warehouse_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order needs at least one line item".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let order_id = Uuid::new_v4();
        let req = request;

        let (order_model, item_models) = db
            .transaction::<_, (order::Model, Vec<order_item::Model>), ServiceError>(move |txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let order_model = order::ActiveModel {
                        id: Set(order_id),
                        customer: Set(req.customer.clone()),
                        warehouse_id: Set(req.warehouse_id),
                        status: Set(OrderStatus::Active),
                        created_at: Set(now),
                        completed_at: Set(None),
                        updated_at: Set(None),
                    }
                    .insert(txn)
                    .await?;

                    let mut item_models = Vec::with_capacity(req.items.len());
                    for item in &req.items {
                        ledger::reserve(
                            txn,
                            order_id,
                            item.product_id,
                            req.warehouse_id,
                            item.quantity,
                            MovementReason::Order,
                        )
                        .await?;

                        let item_model = order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order_id),
                            product_id: Set(item.product_id),
                            quantity: Set(item.quantity),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                        item_models.push(item_model);
                    }

                    Ok((order_model, item_models))
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(order_id = %order_id, "order created");
        self.emit(Event::OrderCreated(order_id)).await;
        for item in &item_models {
            self.emit(Event::StockReserved {
                order_id,
                product_id: item.product_id,
                warehouse_id: order_model.warehouse_id,
                quantity: item.quantity,
            })
            .await;
        }

        Ok(Self::to_response(order_model, item_models))
    }

    /// Replaces an order's line items: reverts the previous reservations,
    /// swaps the item snapshot, and reserves stock for the new items, all
    /// in one transaction. Only active orders may be updated.
    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        if request.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order needs at least one line item".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let req = request;

        type UpdateOutcome = (
            order::Model,
            Vec<order_item::Model>,
            Vec<product_movement::Model>,
        );
        let (order_model, item_models, reverted) = db
            .transaction::<_, UpdateOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let order_model = OrderEntity::find_by_id(order_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", order_id))
                        })?;
                    order_model.status.updatable()?;

                    let reverted =
                        ledger::revert_movements(txn, order_id, MovementReason::OrderUpdate)
                            .await?;

                    OrderItemEntity::delete_many()
                        .filter(order_item::Column::OrderId.eq(order_id))
                        .exec(txn)
                        .await?;

                    let warehouse_id = order_model.warehouse_id;
                    let now = Utc::now();
                    let mut active: order::ActiveModel = order_model.into();
                    if let Some(customer) = req.customer.clone() {
                        active.customer = Set(customer);
                    }
                    active.updated_at = Set(Some(now));
                    let order_model = active.update(txn).await?;

                    let mut item_models = Vec::with_capacity(req.items.len());
                    for item in &req.items {
                        ledger::reserve(
                            txn,
                            order_id,
                            item.product_id,
                            warehouse_id,
                            item.quantity,
                            MovementReason::Order,
                        )
                        .await?;

                        let item_model = order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order_id),
                            product_id: Set(item.product_id),
                            quantity: Set(item.quantity),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                        item_models.push(item_model);
                    }

                    Ok((order_model, item_models, reverted))
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(order_id = %order_id, "order updated");
        self.emit(Event::OrderUpdated(order_id)).await;
        for movement in &reverted {
            self.emit(Event::StockReturned {
                order_id,
                product_id: movement.product_id,
                warehouse_id: movement.warehouse_id,
                quantity: movement.delta.abs(),
                reason: MovementReason::OrderUpdate.to_string(),
            })
            .await;
        }
        for item in &item_models {
            self.emit(Event::StockReserved {
                order_id,
                product_id: item.product_id,
                warehouse_id: order_model.warehouse_id,
                quantity: item.quantity,
            })
            .await;
        }

        Ok(Self::to_response(order_model, item_models))
    }

    /// Marks an active order completed. No stock is touched; the
    /// reservations stand.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn complete_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let order_model = db
            .transaction::<_, order::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let order_model = OrderEntity::find_by_id(order_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", order_id))
                        })?;

                    let new_status = order_model.status.completed()?;
                    let now = Utc::now();
                    let mut active: order::ActiveModel = order_model.into();
                    active.status = Set(new_status);
                    active.completed_at = Set(Some(now));
                    active.updated_at = Set(Some(now));
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(order_id = %order_id, "order completed");
        self.emit(Event::OrderCompleted(order_id)).await;

        self.with_items(order_model).await
    }

    /// Cancels an active order, crediting every reservation back to stock.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let (order_model, reverted) = db
            .transaction::<_, (order::Model, Vec<product_movement::Model>), ServiceError>(
                move |txn| {
                    Box::pin(async move {
                        let order_model = OrderEntity::find_by_id(order_id)
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!("Order {} not found", order_id))
                            })?;

                        let new_status = order_model.status.cancelled()?;
                        let reverted =
                            ledger::revert_movements(txn, order_id, MovementReason::OrderCancel)
                                .await?;

                        let mut active: order::ActiveModel = order_model.into();
                        active.status = Set(new_status);
                        active.updated_at = Set(Some(Utc::now()));
                        Ok((active.update(txn).await?, reverted))
                    })
                },
            )
            .await
            .map_err(map_txn_err)?;

        info!(order_id = %order_id, "order cancelled");
        self.emit(Event::OrderCancelled(order_id)).await;
        for movement in &reverted {
            self.emit(Event::StockReturned {
                order_id,
                product_id: movement.product_id,
                warehouse_id: movement.warehouse_id,
                quantity: movement.delta.abs(),
                reason: MovementReason::OrderCancel.to_string(),
            })
            .await;
        }

        self.with_items(order_model).await
    }

    /// Resumes a cancelled order by re-reserving stock for its original
    /// line items. All-or-nothing: one insufficient item aborts the whole
    /// resume and the order stays cancelled.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn resume_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let (order_model, item_models) = db
            .transaction::<_, (order::Model, Vec<order_item::Model>), ServiceError>(move |txn| {
                Box::pin(async move {
                    let order_model = OrderEntity::find_by_id(order_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", order_id))
                        })?;

                    let new_status = order_model.status.resumed()?;

                    let item_models = OrderItemEntity::find()
                        .filter(order_item::Column::OrderId.eq(order_id))
                        .all(txn)
                        .await?;

                    for item in &item_models {
                        ledger::reserve(
                            txn,
                            order_id,
                            item.product_id,
                            order_model.warehouse_id,
                            item.quantity,
                            MovementReason::OrderResume,
                        )
                        .await?;
                    }

                    let mut active: order::ActiveModel = order_model.into();
                    active.status = Set(new_status);
                    active.updated_at = Set(Some(Utc::now()));
                    let order_model = active.update(txn).await?;

                    Ok((order_model, item_models))
                })
            })
            .await
            .map_err(map_txn_err)?;

        info!(order_id = %order_id, "order resumed");
        self.emit(Event::OrderResumed(order_id)).await;
        for item in &item_models {
            self.emit(Event::StockReserved {
                order_id,
                product_id: item.product_id,
                warehouse_id: order_model.warehouse_id,
                quantity: item.quantity,
            })
            .await;
        }

        Ok(Self::to_response(order_model, item_models))
    }

    /// Fetches an order with its line items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let order_model = OrderEntity::find_by_id(order_id).one(db).await?;
        match order_model {
            Some(order_model) => Ok(Some(self.with_items(order_model).await?)),
            None => Ok(None),
        }
    }

    /// Lists orders filtered by status, customer substring, and creation
    /// date range, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<OrderListResponse, ServiceError> {
        let db = &*self.db_pool;
        let page = filter.page.unwrap_or(1).max(1);
        let per_page = filter.per_page.unwrap_or(15).clamp(1, 100);

        let mut query = OrderEntity::find();
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(customer) = &filter.customer {
            query = query.filter(order::Column::Customer.contains(customer));
        }
        if let Some(from) = filter.date_from {
            let from = from.and_time(NaiveTime::MIN).and_utc();
            query = query.filter(order::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.date_to {
            // Inclusive upper bound: strictly before the following midnight
            let to = to.and_time(NaiveTime::MIN).and_utc() + chrono::Duration::days(1);
            query = query.filter(order::Column::CreatedAt.lt(to));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(db)
            .await?;

        let mut items_by_order: std::collections::HashMap<Uuid, Vec<order_item::Model>> =
            std::collections::HashMap::new();
        for item in items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let responses = orders
            .into_iter()
            .map(|order_model| {
                let order_items = items_by_order.remove(&order_model.id).unwrap_or_default();
                Self::to_response(order_model, order_items)
            })
            .collect();

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            per_page,
        })
    }

    async fn with_items(&self, order_model: order::Model) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let item_models = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_model.id))
            .all(db)
            .await?;
        Ok(Self::to_response(order_model, item_models))
    }

    async fn emit(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            if let Err(e) = sender.send(event).await {
                warn!(error = %e, "failed to send event");
            }
        }
    }

    fn to_response(model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
        OrderResponse {
            id: model.id,
            customer: model.customer,
            warehouse_id: model.warehouse_id,
            status: model.status,
            created_at: model.created_at,
            completed_at: model.completed_at,
            updated_at: model.updated_at,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}
