use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{context::AppContext, error::Result, models::warehouse::WarehouseInput};

/// Get all warehouses handler
pub async fn get_all_warehouses(State(ctx): State<Arc<AppContext>>) -> Result<impl IntoResponse> {
    let warehouses = ctx.warehouses.get_all().await?;
    Ok((StatusCode::OK, Json(warehouses)))
}

/// Get warehouse by ID handler
pub async fn get_warehouse_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let warehouse = ctx.warehouses.get_by_id(id).await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

/// Create warehouse handler
pub async fn create_warehouse(
    State(ctx): State<Arc<AppContext>>,
    Json(input): Json<WarehouseInput>,
) -> Result<impl IntoResponse> {
    let warehouse = ctx.warehouses.create(input).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

/// Update warehouse handler
pub async fn update_warehouse(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(input): Json<WarehouseInput>,
) -> Result<impl IntoResponse> {
    let warehouse = ctx.warehouses.update(id, input).await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

/// Delete warehouse handler
pub async fn delete_warehouse(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.warehouses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
