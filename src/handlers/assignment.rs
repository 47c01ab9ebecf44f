use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{context::AppContext, error::Result, models::assignment::AssignmentInput};

/// Get all assignments handler
pub async fn get_all_assignments(State(ctx): State<Arc<AppContext>>) -> Result<impl IntoResponse> {
    let assignments = ctx.assignments.get_all().await?;
    Ok((StatusCode::OK, Json(assignments)))
}

/// Create assignment handler
pub async fn create_assignment(
    State(ctx): State<Arc<AppContext>>,
    Json(input): Json<AssignmentInput>,
) -> Result<impl IntoResponse> {
    let assignment = ctx.assignments.create(input).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Delete assignment handler
pub async fn delete_assignment(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.assignments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
