//! axum middleware applying the admission limiter to every request

use super::{Admission, AdmissionLimiter, RateLimitInfo};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Admit or reject `request` by client address.
///
/// Use with `axum::middleware::from_fn_with_state`. Rate limit headers are
/// set on every response, admitted or not.
pub async fn rate_limit(
    State(limiter): State<Arc<AdmissionLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let admission = limiter.check(&key);

    let mut response = match admission {
        Admission::Admitted(_) => next.run(request).await,
        Admission::Rejected {
            retry_after_secs, ..
        } => {
            tracing::warn!(client = %key, retry_after_secs, "Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests",
                    "retryAfter": retry_after_secs,
                })),
            )
                .into_response()
        }
    };

    set_headers(response.headers_mut(), admission.info());
    response
}

/// Peer IP address, or `"unknown"` when the server was not started with
/// connect info
fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    headers.insert(LIMIT_HEADER, info.limit.into());
    headers.insert(REMAINING_HEADER, info.remaining.into());
    headers.insert(RESET_HEADER, info.reset_at.into());
}
