//! Traits for the two upstream services: the generative model and the WordPress REST API.
//!
//! Adapters classify transport and payload failures into [`ModelError`] and
//! [`WordPressError`] once, so services never inspect raw HTTP errors.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::posts::FeaturedImage;
use crate::domain::wordpress::WordPressSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("request to the model failed: {0}")]
    Http(String),
    #[error("model responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model request timed out")]
    Timeout,
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model returned a malformed payload: {0}")]
    Malformed(String),
}

/// One grounding citation as returned by the model; either part may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Citation {
    pub title: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroundedText {
    /// Empty when the model produced no text.
    pub text: String,
    pub citations: Vec<Citation>,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Text generation backed by live web search.
    async fn grounded(&self, prompt: &str) -> Result<GroundedText, ModelError>;

    /// Schema-constrained JSON generation. The returned value is already parsed.
    async fn structured(&self, prompt: &str, schema: Value) -> Result<Value, ModelError>;

    /// A single 16:9 image. `Ok(None)` when the model returned no image.
    async fn image(&self, prompt: &str) -> Result<Option<FeaturedImage>, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordPressError {
    #[error("WordPress rejected the credentials (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("WordPress responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("WordPress site is unreachable: {0}")]
    Unreachable(String),
    #[error("WordPress request timed out")]
    Timeout,
    #[error("WordPress returned a malformed payload: {0}")]
    Malformed(String),
    #[error("invalid WordPress site URL: {0}")]
    InvalidSiteUrl(String),
}

/// Identifier and optional link reported by the posts endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDraft {
    pub id: i64,
    pub link: Option<String>,
}

#[async_trait]
pub trait WordPressGateway: Send + Sync {
    /// Authenticated `GET users/me`.
    async fn current_user(&self, settings: &WordPressSettings) -> Result<(), WordPressError>;

    /// `POST posts` with status `draft`.
    async fn create_draft(
        &self,
        settings: &WordPressSettings,
        title: &str,
        content: &str,
    ) -> Result<CreatedDraft, WordPressError>;
}
