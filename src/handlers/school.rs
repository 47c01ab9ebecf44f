use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    context::AppContext,
    error::Result,
    models::school::SchoolInput,
    services::qr_service::{self, QrResponse},
};

/// Get all schools handler
pub async fn get_all_schools(State(ctx): State<Arc<AppContext>>) -> Result<impl IntoResponse> {
    let schools = ctx.schools.get_all().await?;
    Ok((StatusCode::OK, Json(schools)))
}

/// Get school by ID handler
pub async fn get_school_by_id(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let school = ctx.schools.get_by_id(id).await?;
    Ok((StatusCode::OK, Json(school)))
}

/// Create school handler. The identifying token is generated server-side.
pub async fn create_school(
    State(ctx): State<Arc<AppContext>>,
    Json(input): Json<SchoolInput>,
) -> Result<impl IntoResponse> {
    let school = ctx.schools.create(input).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

/// Update school handler
pub async fn update_school(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
    Json(input): Json<SchoolInput>,
) -> Result<impl IntoResponse> {
    let school = ctx.schools.update(id, input).await?;
    Ok((StatusCode::OK, Json(school)))
}

/// Delete school handler
pub async fn delete_school(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    ctx.schools.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Render the school's identifying token as a QR code. This is the code
/// posted at the school and scanned to reach the public order form.
pub async fn get_school_qr(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let school = ctx.schools.get_by_id(id).await?;
    let qr_base64 = qr_service::render_qr_base64(&school.token)?;

    Ok((
        StatusCode::OK,
        Json(QrResponse {
            token: school.token,
            qr_base64,
        }),
    ))
}
