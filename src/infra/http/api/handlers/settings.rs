//! Settings handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use tracing::info;

use crate::application::access::OwnerPrincipal;
use crate::application::settings::SettingsUpdate;

use super::settings_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{SettingsRequest, SettingsResponse};
use crate::infra::http::api::state::ApiState;

pub async fn get_settings(
    State(state): State<ApiState>,
    Extension(_principal): Extension<OwnerPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    let settings = state.settings.current().await.masked();
    Ok(Json(SettingsResponse {
        settings,
        connection: None,
    }))
}

pub async fn put_settings(
    State(state): State<ApiState>,
    Extension(principal): Extension<OwnerPrincipal>,
    Json(payload): Json<SettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = SettingsUpdate {
        site_url: payload.site_url,
        username: payload.username,
        app_password: payload.app_password,
    };
    let (settings, check) = state
        .settings
        .save_and_validate(update)
        .await
        .map_err(settings_to_api)?;

    info!(
        target = "trendpress::api::settings",
        owner = %principal.owner,
        connected = settings.is_connected,
        "settings updated"
    );

    Ok(Json(SettingsResponse {
        settings: settings.masked(),
        connection: Some(check),
    }))
}
