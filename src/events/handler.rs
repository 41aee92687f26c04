//! HTTP handlers for the Events API
//!
//! All endpoints require a bearer token:
//! - `GET /api/v1/event`: list events
//! - `POST /api/v1/event`: create event
//! - `GET /api/v1/event/:id`: event detail
//! - `PUT /api/v1/event/:id`: update (organizer only)
//! - `DELETE /api/v1/event/:id`: delete (organizer only)
//! - `POST /api/v1/event/:id/register`: join event
//! - `GET /api/v1/event/user/:userId`: events organized by a user
//! - `GET /api/v1/event/participant/:userId`: events a user joined

use crate::api::{ApiError, ApiState, AuthUser};
use crate::events::types::*;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

/// Create the events router with all REST endpoints
pub fn events_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/event", get(list_events).post(create_event))
        .route(
            "/api/v1/event/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/api/v1/event/:id/register", post(register_for_event))
        .route("/api/v1/event/user/:user_id", get(events_by_user))
        .route(
            "/api/v1/event/participant/:user_id",
            get(events_for_participant),
        )
        .with_state(state)
}

/// GET /api/v1/event
async fn list_events(
    State(state): State<ApiState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.registry.list_events().await?;
    Ok(Json(serde_json::json!({ "events": events })))
}

/// POST /api/v1/event
async fn create_event(
    State(state): State<ApiState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    if request.title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }

    let event = state
        .registry
        .create_event(request.into_new_event(user.id()))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Event created successfully",
            "event": event,
        })),
    ))
}

/// GET /api/v1/event/:id
async fn get_event(
    State(state): State<ApiState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.registry.get_event(&id).await?;
    Ok(Json(serde_json::json!({ "event": event })))
}

/// PUT /api/v1/event/:id
async fn update_event(
    State(state): State<ApiState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<EventPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = payload?;
    let event = state.registry.update_event(user.id(), &id, patch).await?;
    Ok(Json(serde_json::json!({
        "message": "Event updated successfully",
        "event": event,
    })))
}

/// DELETE /api/v1/event/:id
async fn delete_event(
    State(state): State<ApiState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.registry.delete_event(user.id(), &id).await?;
    Ok(Json(serde_json::json!({ "message": "Event deleted successfully" })))
}

/// POST /api/v1/event/:id/register
async fn register_for_event(
    State(state): State<ApiState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.registry.register_for_event(user.id(), &id).await?;
    Ok(Json(serde_json::json!({
        "message": "Joined event successfully",
        "event": event,
    })))
}

/// GET /api/v1/event/user/:userId
async fn events_by_user(
    State(state): State<ApiState>,
    _user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.registry.events_by_organizer(&user_id).await?;
    if events.is_empty() {
        return Err(ApiError::not_found("No events found for user"));
    }
    Ok(Json(serde_json::json!({ "events": events })))
}

/// GET /api/v1/event/participant/:userId
async fn events_for_participant(
    State(state): State<ApiState>,
    _user: AuthUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let events = state.registry.events_for_participant(&user_id).await?;
    if events.is_empty() {
        return Err(ApiError::not_found("No events found for participant"));
    }
    Ok(Json(serde_json::json!({ "events": events })))
}
