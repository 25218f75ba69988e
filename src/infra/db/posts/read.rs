use sqlx::{Executor, Postgres};

use crate::application::repos::RepoError;
use crate::domain::entities::{PostRecord, PostSummary};
use crate::domain::research::ResearchSource;

use super::super::PostgresRepositories;
use super::super::util::map_sqlx_error;
use super::types::{POST_COLUMNS, PostRow, PostSummaryRow, SourceRow};

impl PostgresRepositories {
    pub(super) async fn fetch_sources<'e, E>(
        executor: E,
        post_id: i64,
    ) -> Result<Vec<ResearchSource>, RepoError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, SourceRow>(
            "SELECT title, uri FROM sources WHERE post_id = $1 ORDER BY position ASC",
        )
        .bind(post_id)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ResearchSource::from).collect())
    }

    pub(super) async fn fetch_owned_post(
        &self,
        owner: &str,
        id: i64,
    ) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let sources = Self::fetch_sources(self.pool(), row.id).await?;
                Ok(Some(row.into_record(sources)))
            }
            None => Ok(None),
        }
    }

    pub(super) async fn fetch_summaries(&self, owner: &str) -> Result<Vec<PostSummary>, RepoError> {
        let rows = sqlx::query_as::<_, PostSummaryRow>(
            "SELECT id, title, status, wordpress_link, updated_at \
             FROM posts WHERE user_id = $1 ORDER BY updated_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostSummary::from).collect())
    }
}
