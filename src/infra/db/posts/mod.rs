mod read;
mod types;
mod write;

use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PostPatch, PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, PostSummary};

use super::PostgresRepositories;

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.insert_post(params).await
    }

    async fn find_post(&self, owner: &str, id: i64) -> Result<Option<PostRecord>, RepoError> {
        self.fetch_owned_post(owner, id).await
    }

    async fn list_posts(&self, owner: &str) -> Result<Vec<PostSummary>, RepoError> {
        self.fetch_summaries(owner).await
    }

    async fn patch_post(
        &self,
        owner: &str,
        id: i64,
        patch: PostPatch,
    ) -> Result<PostRecord, RepoError> {
        self.update_post(owner, id, patch).await
    }

    async fn delete_post(&self, owner: &str, id: i64) -> Result<(), RepoError> {
        self.remove_post(owner, id).await
    }
}
