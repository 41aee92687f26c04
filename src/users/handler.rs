//! HTTP handlers for the auth API
//!
//! - `POST /api/v1/auth/register`: sign up
//! - `POST /api/v1/auth/login`: exchange credentials for a token
//! - `GET /api/v1/auth/me/created`: events the caller organizes
//! - `GET /api/v1/auth/me/registered`: events the caller joined

use crate::api::{ApiError, ApiState, AuthUser};
use crate::users::types::*;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

/// Create the auth router
pub fn auth_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(sign_up))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me/created", get(created_events))
        .route("/api/v1/auth/me/registered", get(registered_events))
        .with_state(state)
}

/// POST /api/v1/auth/register
async fn sign_up(
    State(state): State<ApiState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.name.is_empty() || request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("name, email and password are required"));
    }

    let user = state
        .registry
        .sign_up(&request.name, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User created",
            "user": UserView::from(user),
        })),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let token = state
        .registry
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "token": token,
    })))
}

/// GET /api/v1/auth/me/created
async fn created_events(
    State(state): State<ApiState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.registry.events_created_by(user.id()).await?;
    Ok(Json(serde_json::json!({ "events": events })))
}

/// GET /api/v1/auth/me/registered
async fn registered_events(
    State(state): State<ApiState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.registry.events_joined_by(user.id()).await?;
    Ok(Json(serde_json::json!({ "events": events })))
}
