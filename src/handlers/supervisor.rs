use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    context::AppContext,
    error::Result,
    models::supervisor::SupervisorInput,
    services::qr_service::{self, QrResponse},
};

/// Get all supervisors handler
pub async fn get_all_supervisors(State(ctx): State<Arc<AppContext>>) -> Result<impl IntoResponse> {
    let supervisors = ctx.supervisors.get_all().await?;
    Ok((StatusCode::OK, Json(supervisors)))
}

/// Get supervisor by ID handler
pub async fn get_supervisor_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let supervisor = ctx.supervisors.get_by_id(id).await?;
    Ok((StatusCode::OK, Json(supervisor)))
}

/// Create supervisor handler
pub async fn create_supervisor(
    State(ctx): State<Arc<AppContext>>,
    Json(input): Json<SupervisorInput>,
) -> Result<impl IntoResponse> {
    let supervisor = ctx.supervisors.create(input).await?;
    Ok((StatusCode::CREATED, Json(supervisor)))
}

/// Update supervisor handler
pub async fn update_supervisor(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(input): Json<SupervisorInput>,
) -> Result<impl IntoResponse> {
    let supervisor = ctx.supervisors.update(id, input).await?;
    Ok((StatusCode::OK, Json(supervisor)))
}

/// Delete supervisor handler
pub async fn delete_supervisor(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.supervisors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Render the supervisor's identifying token as a QR code
pub async fn get_supervisor_qr(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let supervisor = ctx.supervisors.get_by_id(id).await?;
    let qr_base64 = qr_service::render_qr_base64(&supervisor.token)?;

    Ok((
        StatusCode::OK,
        Json(QrResponse {
            token: supervisor.token,
            qr_base64,
        }),
    ))
}
