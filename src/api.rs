//! Unified API router
//!
//! Merges the module routers into a single axum `Router` with CORS, request
//! tracing, and the admission limiter in front of every `/api` route.
//!
//! ## Endpoint Map
//!
//! | Prefix               | Module | Description                         |
//! |----------------------|--------|-------------------------------------|
//! | `/health`            | api    | Health probe (not rate limited)     |
//! | `/api/v1/auth/*`     | users  | Sign up, login, own event lists     |
//! | `/api/v1/event/*`    | events | Event CRUD and registration         |

use crate::error::Error;
use crate::events::events_router;
use crate::ratelimit::{rate_limit, AdmissionLimiter};
use crate::registry::Registry;
use crate::users::{auth_router, User};
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{header, request::Parts, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<Registry>,
}

/// Build the complete HTTP application
pub fn build_app(
    registry: Arc<Registry>,
    limiter: Arc<AdmissionLimiter>,
    cors_origins: &[String],
) -> Router {
    let state = ApiState { registry };

    let api = Router::new()
        .merge(auth_router(state.clone()))
        .merge(events_router(state))
        .layer(from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(cors_origins))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Errors
// =============================================================================

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) => Self::not_found(err.to_string()),
            Error::Conflict(_) => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            Error::NoCapacity | Error::AlreadyRegistered => Self::bad_request(err.to_string()),
            Error::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
            Error::InvalidCredentials | Error::Unauthorized(_) => {
                Self::unauthorized(err.to_string())
            }
            Error::Config(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Crypto(_)
            | Error::Internal(_) => {
                tracing::error!(error = %err, "Request failed");
                Self::internal("something went wrong")
            }
        }
    }
}

/// Malformed or incomplete JSON bodies are reported as 400 with the usual
/// error body instead of axum's plain-text rejection
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// The user behind a valid `Authorization: Bearer <token>` header
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<ApiState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::unauthorized("Authorization header missing or malformed"))?;

        match state.registry.authenticate(token).await {
            Ok(user) => Ok(Self(user)),
            Err(Error::Unauthorized(reason)) => {
                tracing::debug!(reason = %reason, "Rejected bearer token");
                Err(ApiError::unauthorized("Invalid or expired token"))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}
