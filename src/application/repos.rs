//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{PostRecord, PostSummary};
use crate::domain::research::{ResearchSource, TrendAnalysis};
use crate::domain::types::PostStatus;
use crate::domain::wordpress::WordPressSettings;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub owner: String,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub research_summary: Option<String>,
    pub trend_analysis: Option<TrendAnalysis>,
    pub sources: Vec<ResearchSource>,
    pub featured_image_url: Option<String>,
}

/// Partial update. `None` leaves a column untouched; every patch refreshes `updated_at`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub featured_image_url: Option<String>,
    pub wordpress_id: Option<i64>,
    pub wordpress_link: Option<String>,
}

impl PostPatch {
    /// Reject patches that would move the record's status backwards.
    pub fn check_status(&self, current: PostStatus) -> Result<(), RepoError> {
        match self.status {
            Some(next) => current
                .ensure_advance(next)
                .map_err(|err| RepoError::Integrity {
                    message: err.to_string(),
                }),
            None => Ok(()),
        }
    }

    /// Apply the patch to an in-memory record.
    pub fn apply(self, record: &mut PostRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(content) = self.content {
            record.content = content;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(url) = self.featured_image_url {
            record.featured_image_url = Some(url);
        }
        if let Some(id) = self.wordpress_id {
            record.wordpress_id = Some(id);
        }
        if let Some(link) = self.wordpress_link {
            record.wordpress_link = Some(link);
        }
    }
}

/// Post records, always scoped to the owning user.
///
/// A record that exists but belongs to someone else behaves exactly like a missing one.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn find_post(&self, owner: &str, id: i64) -> Result<Option<PostRecord>, RepoError>;

    /// Newest first by `updated_at`.
    async fn list_posts(&self, owner: &str) -> Result<Vec<PostSummary>, RepoError>;

    async fn patch_post(
        &self,
        owner: &str,
        id: i64,
        patch: PostPatch,
    ) -> Result<PostRecord, RepoError>;

    /// Sources are removed along with the post.
    async fn delete_post(&self, owner: &str, id: i64) -> Result<(), RepoError>;
}

/// Durable storage for the single WordPress settings entry.
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn read_settings(&self) -> Result<Option<WordPressSettings>, RepoError>;

    async fn write_settings(&self, settings: &WordPressSettings) -> Result<(), RepoError>;
}
