pub mod api;
mod middleware;

pub use api::rate_limit::ApiRateLimiter;
pub use api::{ApiState, build_api_router as build_api_v1_router};

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware as axum_middleware, routing::get};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::infra::db::PostgresRepositories;

use self::middleware::{log_responses, set_request_context};

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

#[derive(Clone)]
pub struct RouterState {
    pub api: ApiState,
    /// Absent when posts are kept in memory.
    pub db: Option<Arc<PostgresRepositories>>,
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

async fn health(State(state): State<RouterState>) -> Response {
    match &state.db {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Full application router: the authenticated API plus the unauthenticated health probe.
pub fn build_router(state: RouterState) -> Router {
    let api_router = build_api_v1_router(state.clone());

    Router::new()
        .route("/health", get(health))
        .merge(api_router)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
