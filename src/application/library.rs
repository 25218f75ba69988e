//! Saved posts as listed in the sidebar.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, PostSummary};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for LibraryError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => LibraryError::NotFound,
            other => LibraryError::Repo(other),
        }
    }
}

#[derive(Clone)]
pub struct PostLibrary {
    posts: Arc<dyn PostsRepo>,
}

impl PostLibrary {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<PostSummary>, LibraryError> {
        Ok(self.posts.list_posts(owner).await?)
    }

    pub async fn get(&self, owner: &str, id: i64) -> Result<PostRecord, LibraryError> {
        self.posts
            .find_post(owner, id)
            .await?
            .ok_or(LibraryError::NotFound)
    }

    pub async fn delete(&self, owner: &str, id: i64) -> Result<(), LibraryError> {
        self.posts.delete_post(owner, id).await?;
        info!(
            target = "trendpress::application::library",
            owner,
            post_id = id,
            "post deleted"
        );
        Ok(())
    }
}
