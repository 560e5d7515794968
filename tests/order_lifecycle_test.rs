mod common;

use assert_matches::assert_matches;
use uuid::Uuid;

use warehouse_api::entities::order::OrderStatus;
use warehouse_api::errors::ServiceError;
use warehouse_api::services::orders::{
    CreateOrderRequest, OrderFilter, OrderItemInput, UpdateOrderRequest,
};

fn item(product_id: Uuid, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn create_reserves_stock_and_journals_debits() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    let gadget = common::seed_product(&db, "Gadget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;
    common::seed_stock(&db, gadget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3), item(gadget, 2)],
        })
        .await
        .expect("create should succeed");

    assert_eq!(order.status, OrderStatus::Active);
    assert_eq!(order.items.len(), 2);
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 2);
    assert_eq!(common::stock_quantity(&db, gadget, warehouse_id).await, 3);

    let mut expected = vec![
        (widget, -3, "order".to_string()),
        (gadget, -2, "order".to_string()),
    ];
    expected.sort();
    assert_eq!(common::movement_summary(&db, order.id).await, expected);
}

#[tokio::test]
async fn create_is_atomic_when_one_item_is_short() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    let gadget = common::seed_product(&db, "Gadget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;
    common::seed_stock(&db, gadget, warehouse_id, 1).await;

    let result = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 2), item(gadget, 5)],
        })
        .await;

    assert_matches!(
        result,
        Err(ServiceError::InsufficientStock {
            requested: 5,
            available: 1,
            ..
        })
    );
    // The widget debit from the same transaction must be rolled back too.
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 5);
    assert_eq!(common::stock_quantity(&db, gadget, warehouse_id).await, 1);

    let listing = service.list_orders(OrderFilter::default()).await.unwrap();
    assert_eq!(listing.total, 0);
}

#[tokio::test]
async fn create_fails_when_product_has_no_stock_row() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;

    let result = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 1)],
        })
        .await;

    assert_matches!(
        result,
        Err(ServiceError::InsufficientStock {
            requested: 1,
            available: 0,
            ..
        })
    );
}

#[tokio::test]
async fn cancel_credits_stock_back_and_marks_debits_reverted() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    let gadget = common::seed_product(&db, "Gadget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;
    common::seed_stock(&db, gadget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3), item(gadget, 2)],
        })
        .await
        .unwrap();

    let cancelled = service.cancel_order(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 5);
    assert_eq!(common::stock_quantity(&db, gadget, warehouse_id).await, 5);

    let movements = common::movements_for_order(&db, order.id).await;
    assert_eq!(movements.len(), 4);
    for movement in &movements {
        if movement.delta < 0 {
            assert!(movement.reverted_at.is_some(), "debit not marked reverted");
        } else {
            assert_eq!(movement.reason, "order_cancel");
            assert!(movement.reverted_at.is_none());
        }
    }
}

#[tokio::test]
async fn cancel_is_rejected_for_a_cancelled_order() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();
    service.cancel_order(order.id).await.unwrap();

    let result = service.cancel_order(order.id).await;
    assert_matches!(result, Err(ServiceError::IllegalTransition { .. }));
    // No double credit.
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 5);
}

#[tokio::test]
async fn resume_re_reserves_the_original_items() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();
    service.cancel_order(order.id).await.unwrap();

    let resumed = service.resume_order(order.id).await.unwrap();
    assert_eq!(resumed.status, OrderStatus::Active);
    assert_eq!(resumed.items.len(), 1);
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 2);

    let summary = common::movement_summary(&db, order.id).await;
    assert!(summary.contains(&(widget, -3, "order_resume".to_string())));
}

#[tokio::test]
async fn resume_aborts_whole_when_stock_was_taken_meanwhile() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    let gadget = common::seed_product(&db, "Gadget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;
    common::seed_stock(&db, gadget, warehouse_id, 2).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3), item(gadget, 2)],
        })
        .await
        .unwrap();
    service.cancel_order(order.id).await.unwrap();

    // Another customer takes the gadgets while the order is cancelled.
    service
        .create_order(CreateOrderRequest {
            customer: "Globex".into(),
            warehouse_id,
            items: vec![item(gadget, 2)],
        })
        .await
        .unwrap();

    let result = service.resume_order(order.id).await;
    assert_matches!(result, Err(ServiceError::InsufficientStock { .. }));

    // The partial widget reservation must be rolled back with the resume.
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 5);
    let current = service.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(current.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn resume_is_rejected_for_an_active_order() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 1)],
        })
        .await
        .unwrap();

    let result = service.resume_order(order.id).await;
    assert_matches!(result, Err(ServiceError::IllegalTransition { .. }));
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 4);
}

#[tokio::test]
async fn complete_stamps_completed_at_and_keeps_reservations() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();

    let completed = service.complete_order(order.id).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 2);
}

#[tokio::test]
async fn completed_orders_admit_no_further_transitions() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();
    service.complete_order(order.id).await.unwrap();

    assert_matches!(
        service.complete_order(order.id).await,
        Err(ServiceError::IllegalTransition { .. })
    );
    assert_matches!(
        service.cancel_order(order.id).await,
        Err(ServiceError::IllegalTransition { .. })
    );
    assert_matches!(
        service.resume_order(order.id).await,
        Err(ServiceError::IllegalTransition { .. })
    );
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 2);
}

#[tokio::test]
async fn update_replaces_items_and_reservations() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    let gadget = common::seed_product(&db, "Gadget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;
    common::seed_stock(&db, gadget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();

    let updated = service
        .update_order(
            order.id,
            UpdateOrderRequest {
                customer: Some("Acme Corp".into()),
                items: vec![item(widget, 1), item(gadget, 2)],
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.customer, "Acme Corp");
    assert_eq!(updated.items.len(), 2);
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 4);
    assert_eq!(common::stock_quantity(&db, gadget, warehouse_id).await, 3);

    let mut expected = vec![
        (widget, -3, "order".to_string()),
        (widget, 3, "order_update".to_string()),
        (widget, -1, "order".to_string()),
        (gadget, -2, "order".to_string()),
    ];
    expected.sort();
    assert_eq!(common::movement_summary(&db, order.id).await, expected);
}

#[tokio::test]
async fn update_rolls_back_entirely_on_insufficient_stock() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();

    // Reverting the old reservation frees 3, so 5 are available inside the
    // transaction, still short of 6.
    let result = service
        .update_order(
            order.id,
            UpdateOrderRequest {
                customer: None,
                items: vec![item(widget, 6)],
            },
        )
        .await;
    assert_matches!(
        result,
        Err(ServiceError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        })
    );

    // Everything from the failed attempt is undone, including the revert.
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 2);
    let current = service.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(current.items.len(), 1);
    assert_eq!(current.items[0].quantity, 3);

    let movements = common::movements_for_order(&db, order.id).await;
    assert_eq!(movements.len(), 1);
    assert!(movements[0].reverted_at.is_none());
}

#[tokio::test]
async fn update_is_rejected_unless_the_order_is_active() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 5).await;

    let order = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 3)],
        })
        .await
        .unwrap();
    service.cancel_order(order.id).await.unwrap();

    let result = service
        .update_order(
            order.id,
            UpdateOrderRequest {
                customer: None,
                items: vec![item(widget, 1)],
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::IllegalTransition { .. }));
    assert_eq!(common::stock_quantity(&db, widget, warehouse_id).await, 5);
}

#[tokio::test]
async fn get_order_returns_none_for_unknown_id() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);

    let result = service.get_order(Uuid::new_v4()).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn transitions_on_unknown_orders_are_not_found() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);

    assert_matches!(
        service.cancel_order(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        service.complete_order(Uuid::new_v4()).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn list_orders_filters_by_status_and_customer() {
    let db = common::setup_db().await;
    let service = common::order_service(&db);
    let warehouse_id = common::seed_warehouse(&db, "Main").await;
    let widget = common::seed_product(&db, "Widget").await;
    common::seed_stock(&db, widget, warehouse_id, 10).await;

    let acme = service
        .create_order(CreateOrderRequest {
            customer: "Acme".into(),
            warehouse_id,
            items: vec![item(widget, 1)],
        })
        .await
        .unwrap();
    let globex = service
        .create_order(CreateOrderRequest {
            customer: "Globex".into(),
            warehouse_id,
            items: vec![item(widget, 1)],
        })
        .await
        .unwrap();
    service.cancel_order(globex.id).await.unwrap();

    let active = service
        .list_orders(OrderFilter {
            status: Some(OrderStatus::Active),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.total, 1);
    assert_eq!(active.orders[0].id, acme.id);

    let by_customer = service
        .list_orders(OrderFilter {
            customer: Some("Glob".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_customer.total, 1);
    assert_eq!(by_customer.orders[0].status, OrderStatus::Cancelled);
    assert_eq!(by_customer.orders[0].items.len(), 1);
}
