use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    context::AppContext,
    error::Result,
    models::product::{NewProduct, ProductUpdate, StockUpdate},
};

/// Get all products handler
pub async fn get_all_products(State(ctx): State<Arc<AppContext>>) -> Result<impl IntoResponse> {
    let products = ctx.products.get_all().await?;
    Ok((StatusCode::OK, Json(products)))
}

/// Get product by ID handler
pub async fn get_product_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let product = ctx.products.get_by_id(id).await?;
    Ok((StatusCode::OK, Json(product)))
}

/// Create product handler
pub async fn create_product(
    State(ctx): State<Arc<AppContext>>,
    Json(input): Json<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = ctx.products.create(input).await?;

    // A product can be created already under the threshold
    ctx.notifications.check_low_stock().await;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update product name/code handler
pub async fn update_product(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(input): Json<ProductUpdate>,
) -> Result<impl IntoResponse> {
    let product = ctx.products.update(id, input).await?;
    Ok((StatusCode::OK, Json(product)))
}

/// Direct stock edit handler
pub async fn set_product_stock(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(input): Json<StockUpdate>,
) -> Result<impl IntoResponse> {
    let product = ctx.products.set_stock(id, input.quantity).await?;

    // Stock changed, so re-run the low-stock sweep
    ctx.notifications.check_low_stock().await;

    Ok((StatusCode::OK, Json(product)))
}

/// Delete product handler
pub async fn delete_product(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
