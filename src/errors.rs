use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::order::OrderStatus;

/// Standard error envelope returned by every handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional detail (validation errors and the like)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(
        "Insufficient stock for product {product_id} in warehouse {warehouse_id}: \
         requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        warehouse_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Cannot {action} an order in status '{from}'")]
    IllegalTransition { from: OrderStatus, action: String },

    #[error(
        "Ledger corruption: no stock row for product {product_id} in warehouse {warehouse_id} \
         while reverting movements"
    )]
    CorruptLedger {
        product_id: Uuid,
        warehouse_id: Uuid,
    },

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    pub fn illegal_transition(from: OrderStatus, action: impl Into<String>) -> Self {
        ServiceError::IllegalTransition {
            from,
            action: action.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::IllegalTransition { .. } => StatusCode::CONFLICT,
            Self::DatabaseError(_)
            | Self::CorruptLedger { .. }
            | Self::EventError(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may meaningfully retry the failed operation.
    /// Only storage-layer faults (deadlock, timeout, connectivity) qualify;
    /// insufficiency and illegal transitions are terminal for the attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError(_))
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::CorruptLedger { .. } | Self::EventError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
