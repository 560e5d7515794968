use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    errors::ServiceError, services::warehouses::CreateWarehouseRequest, ApiResponse, AppState,
};

pub async fn create_warehouse(
    State(state): State<AppState>,
    Json(request): Json<CreateWarehouseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouse = state.services.warehouses.create_warehouse(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(warehouse))))
}

pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let warehouses = state.services.warehouses.list_warehouses().await?;
    Ok(Json(ApiResponse::success(warehouses)))
}
