pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::infra::http::RouterState;

pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    let auth_state = state.clone();
    let rate_state = state.clone();

    Router::new()
        .route("/api/v1/sessions", post(handlers::open_session))
        .route(
            "/api/v1/sessions/{id}",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route(
            "/api/v1/sessions/{id}/research",
            post(handlers::submit_research),
        )
        .route(
            "/api/v1/sessions/{id}/topics/select",
            post(handlers::select_topic),
        )
        .route("/api/v1/sessions/{id}/refine", post(handlers::refine_topic))
        .route("/api/v1/sessions/{id}/start-over", post(handlers::start_over))
        .route("/api/v1/sessions/{id}/try-again", post(handlers::try_again))
        .route(
            "/api/v1/sessions/{id}/content",
            put(handlers::update_content),
        )
        .route(
            "/api/v1/sessions/{id}/publish",
            post(handlers::publish_draft),
        )
        .route("/api/v1/posts", get(handlers::list_posts))
        .route(
            "/api/v1/posts/{id}",
            get(handlers::get_post).delete(handlers::delete_post),
        )
        .route(
            "/api/v1/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::api_rate_limit,
        ))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ))
}
