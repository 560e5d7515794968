//! Warehouse API Library
//!
//! Warehouse inventory and sales-order engine: per-warehouse stock levels,
//! an append-only movement ledger, and an order lifecycle that keeps both
//! consistent under concurrent access.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

/// Full v1 API surface.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order).put(handlers::orders::update_order),
        )
        .route("/orders/:id/complete", post(handlers::orders::complete_order))
        .route("/orders/:id/cancel", post(handlers::orders::cancel_order))
        .route("/orders/:id/resume", post(handlers::orders::resume_order))
        .route("/products", get(handlers::products::list_products))
        .route("/movements", get(handlers::movements::list_movements))
        .route(
            "/warehouses",
            get(handlers::warehouses::list_warehouses).post(handlers::warehouses::create_warehouse),
        )
        .route("/health", get(handlers::health::health))
}
