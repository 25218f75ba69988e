//! Saved post handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::application::access::OwnerPrincipal;

use super::library_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::PostListResponse;
use crate::infra::http::api::state::ApiState;

pub async fn list_posts(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state
        .library
        .list(&principal.owner)
        .await
        .map_err(library_to_api)?;
    Ok(Json(PostListResponse { posts }))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .library
        .get(&principal.owner, id)
        .await
        .map_err(library_to_api)?;
    Ok(Json(record))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .library
        .delete(&principal.owner, id)
        .await
        .map_err(library_to_api)?;

    info!(
        target = "trendpress::api::posts",
        owner = %principal.owner,
        post_id = id,
        "post deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
