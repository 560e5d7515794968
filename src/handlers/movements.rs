use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{errors::ServiceError, services::movements::MovementFilter, ApiResponse, AppState};

pub async fn list_movements(
    State(state): State<AppState>,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state.services.movements.list_movements(filter).await?;
    Ok(Json(ApiResponse::success(movements)))
}
