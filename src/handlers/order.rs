use std::sync::Arc;

use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    context::AppContext,
    error::{AppError, Result},
    models::{order::OrderSubmission, user::Principal},
};

/// Public order submission handler. Unauthenticated; the school token from
/// the scanned code is the only credential.
pub async fn submit_order(
    State(ctx): State<Arc<AppContext>>,
    Json(submission): Json<OrderSubmission>,
) -> Result<impl IntoResponse> {
    let detail = ctx
        .order_service
        .submit(submission)
        .await
        .map_err(AppError::from)?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get all orders handler
pub async fn get_all_orders(State(ctx): State<Arc<AppContext>>) -> Result<impl IntoResponse> {
    let orders = ctx.orders.get_all().await?;
    Ok((StatusCode::OK, Json(orders)))
}

/// Get order with its lines handler
pub async fn get_order_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let detail = ctx.orders.get_detail(id).await?;
    Ok((StatusCode::OK, Json(detail)))
}

/// Approve order handler
pub async fn approve_order(
    State(ctx): State<Arc<AppContext>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let order = ctx
        .order_service
        .approve(id)
        .await
        .map_err(AppError::from)?;

    tracing::info!(order_id = order.id, approved_by = %principal.username, "order approved");

    Ok((StatusCode::OK, Json(order)))
}

/// Reject order handler
pub async fn reject_order(
    State(ctx): State<Arc<AppContext>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let order = ctx
        .order_service
        .reject(id)
        .await
        .map_err(AppError::from)?;

    tracing::info!(order_id = order.id, rejected_by = %principal.username, "order rejected");

    Ok((StatusCode::OK, Json(order)))
}
