use std::sync::Arc;

use axum::{
    extract::{Json, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    context::AppContext,
    error::{AppError, Result},
};

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Handler for username/password login
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let response = ctx.auth.login(&request.username, &request.password).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// Middleware guarding the administrative surface. Decodes the bearer
/// token, loads the user, and injects the resulting Principal into the
/// request extensions for downstream handlers.
pub async fn require_admin(
    State(ctx): State<Arc<AppContext>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Auth("Missing authorization header".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Expected a bearer token".into()))?;

    let principal = ctx.auth.verify_token(token).await?;

    if !principal.is_admin {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
