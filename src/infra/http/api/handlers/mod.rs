//! API handlers organized by resource type.
//!
//! Error conversions shared by the handler modules live here.

mod posts;
mod sessions;
mod settings;

pub use posts::*;
pub use sessions::*;
pub use settings::*;

use axum::http::StatusCode;

use crate::application::library::LibraryError;
use crate::application::repos::RepoError;
use crate::application::settings::SettingsError;
use crate::application::workflow::WorkflowError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { .. } => ApiError::not_found("resource not found"),
        DomainError::Validation { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        DomainError::StatusRegression { .. } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(err.to_string()),
        ),
        DomainError::Transition(transition) => ApiError::new(
            StatusCode::CONFLICT,
            codes::INVALID_TRANSITION,
            "Action not allowed in the current stage",
            Some(transition.to_string()),
        ),
    }
}

pub(crate) fn workflow_to_api(err: WorkflowError) -> ApiError {
    match err {
        WorkflowError::Invalid(domain) => domain_to_api(domain),
        WorkflowError::Transition(transition) => ApiError::new(
            StatusCode::CONFLICT,
            codes::INVALID_TRANSITION,
            "Action not allowed in the current stage",
            Some(transition.to_string()),
        ),
        WorkflowError::NotConnected => ApiError::new(
            StatusCode::CONFLICT,
            codes::NOT_CONNECTED,
            "WordPress is not connected",
            Some("save and validate the WordPress settings first".to_string()),
        ),
        WorkflowError::NotFound => ApiError::not_found("post not found"),
        WorkflowError::NoSuchTopic(index) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(format!("no suggested topic at index {index}")),
        ),
        WorkflowError::Persistence(repo) => repo_to_api(repo),
    }
}

pub(crate) fn library_to_api(err: LibraryError) -> ApiError {
    match err {
        LibraryError::NotFound => ApiError::not_found("post not found"),
        LibraryError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn settings_to_api(err: SettingsError) -> ApiError {
    match err {
        SettingsError::Repo(repo) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::SETTINGS,
            "Settings could not be saved",
            Some(repo.to_string()),
        ),
    }
}
