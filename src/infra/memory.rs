//! In-memory posts repository, used when no database URL is configured.
//!
//! Records live only as long as the process.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::application::repos::{CreatePostParams, PostPatch, PostsRepo, RepoError};
use crate::domain::entities::{PostRecord, PostSummary};

#[derive(Debug, Default)]
struct Store {
    records: BTreeMap<i64, PostRecord>,
    next_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPostsRepo {
    store: Arc<RwLock<Store>>,
}

impl InMemoryPostsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.records.is_empty()
    }
}

#[async_trait]
impl PostsRepo for InMemoryPostsRepo {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut store = self.store.write().await;
        store.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let record = PostRecord {
            id: store.next_id,
            title: params.title,
            content: params.content,
            status: params.status,
            research_summary: params.research_summary,
            trend_analysis: params.trend_analysis,
            sources: params.sources,
            featured_image_url: params.featured_image_url,
            wordpress_id: None,
            wordpress_link: None,
            created_at: now,
            updated_at: now,
            user_id: params.owner,
        };
        store.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_post(&self, owner: &str, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .records
            .get(&id)
            .filter(|record| record.user_id == owner)
            .cloned())
    }

    async fn list_posts(&self, owner: &str) -> Result<Vec<PostSummary>, RepoError> {
        let store = self.store.read().await;
        let mut owned: Vec<&PostRecord> = store
            .records
            .values()
            .filter(|record| record.user_id == owner)
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(owned.into_iter().map(PostSummary::from).collect())
    }

    async fn patch_post(
        &self,
        owner: &str,
        id: i64,
        patch: PostPatch,
    ) -> Result<PostRecord, RepoError> {
        let mut store = self.store.write().await;
        let record = store
            .records
            .get_mut(&id)
            .filter(|record| record.user_id == owner)
            .ok_or(RepoError::NotFound)?;
        patch.check_status(record.status)?;
        patch.apply(record);
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn delete_post(&self, owner: &str, id: i64) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        match store.records.get(&id) {
            Some(record) if record.user_id == owner => {
                store.records.remove(&id);
                Ok(())
            }
            _ => Err(RepoError::NotFound),
        }
    }
}
