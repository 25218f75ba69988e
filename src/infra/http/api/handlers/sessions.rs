//! Workflow session handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;
use uuid::Uuid;

use crate::application::access::OwnerPrincipal;
use crate::application::workflow::{TopicChoice, WorkflowController};

use super::workflow_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

fn session(
    state: &ApiState,
    principal: &OwnerPrincipal,
    id: Uuid,
) -> Result<Arc<WorkflowController>, ApiError> {
    state
        .sessions
        .get(&principal.owner, id)
        .ok_or_else(|| ApiError::not_found("session not found"))
}

pub async fn open_session(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    payload: Option<Json<SessionOpenRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let (id, controller) = state
        .sessions
        .open(&principal.owner, payload.post_id)
        .await
        .map_err(workflow_to_api)?;

    info!(
        target = "trendpress::api::sessions",
        owner = %principal.owner,
        session = %id,
        restored_from = ?payload.post_id,
        "session opened"
    );

    let view = controller.view().await;
    Ok((StatusCode::CREATED, Json(SessionResponse { id, view })))
}

pub async fn get_session(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller.view().await;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn close_session(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.sessions.close(&principal.owner, id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("session not found"))
    }
}

pub async fn submit_research(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller
        .submit_topic(&payload.topic)
        .await
        .map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn select_topic(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
    Json(choice): Json<TopicChoice>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller
        .select_topic(choice)
        .await
        .map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn refine_topic(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller.refine().await.map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn start_over(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller.start_over().await.map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn try_again(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller.try_again().await.map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn update_content(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller
        .update_content(&payload.content, payload.persist)
        .await
        .map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}

pub async fn publish_draft(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let controller = session(&state, &principal, id)?;
    let view = controller.publish().await.map_err(workflow_to_api)?;
    Ok(Json(SessionResponse { id, view }))
}
