use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::application::access::{AuthError, OwnerPrincipal};

use super::error::ApiError;
use super::rate_limit::Admission;
use super::state::ApiState;

pub async fn api_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers().get(axum::http::header::AUTHORIZATION)) {
        Some(value) => value,
        None => return ApiError::unauthorized().into_response(),
    };

    let principal = match state.tokens.authenticate(&token) {
        Ok(principal) => principal,
        Err(AuthError::Missing) | Err(AuthError::Invalid) => {
            return ApiError::unauthorized().into_response();
        }
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

/// Reads are never limited. Writes count per owner against the matched route
/// template, so every session of one owner shares a window.
pub async fn api_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::GET {
        return next.run(request).await;
    }

    let route = match request.extensions().get::<MatchedPath>() {
        Some(matched) => format!("{} {}", request.method(), matched.as_str()),
        None => format!("{} {}", request.method(), request.uri().path()),
    };
    let owner = match request.extensions().get::<OwnerPrincipal>() {
        Some(principal) => principal.owner.clone(),
        None => {
            warn!(
                target = "trendpress::api::ratelimit",
                "missing principal in rate limit middleware"
            );
            return ApiError::unauthorized().into_response();
        }
    };

    match state.rate_limiter.admit(&owner, &route) {
        Admission::Allowed { .. } => next.run(request).await,
        Admission::Throttled { retry_after } => {
            warn!(
                target = "trendpress::api::ratelimit",
                owner = %owner,
                route = %route,
                limit = state.rate_limiter.limit(),
                "rate limit exceeded"
            );
            ApiError::rate_limited(retry_after)
        }
    }
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}
