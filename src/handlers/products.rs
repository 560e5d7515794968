use axum::{extract::State, response::IntoResponse, Json};

use crate::{errors::ServiceError, ApiResponse, AppState};

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let products = state.services.products.products_with_stock().await?;
    Ok(Json(ApiResponse::success(products)))
}
