use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::application::repos::{CreatePostParams, PostPatch, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::research::ResearchSource;
use crate::domain::types::PostStatus;

use super::super::PostgresRepositories;
use super::super::util::map_sqlx_error;
use super::types::{POST_COLUMNS, PostRow};

impl PostgresRepositories {
    pub(super) async fn insert_post(
        &self,
        params: CreatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            owner,
            title,
            content,
            status,
            research_summary,
            trend_analysis,
            sources,
            featured_image_url,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        let sql = format!(
            "INSERT INTO posts (user_id, title, content, status, research_summary, \
             trend_analysis, featured_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(owner)
            .bind(title)
            .bind(content)
            .bind(status)
            .bind(research_summary)
            .bind(trend_analysis.map(Json))
            .bind(featured_image_url)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        insert_sources(&mut tx, row.id, &sources).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into_record(sources))
    }

    pub(super) async fn update_post(
        &self,
        owner: &str,
        id: i64,
        patch: PostPatch,
    ) -> Result<PostRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let current: Option<(PostStatus,)> = sqlx::query_as(
            "SELECT status FROM posts WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let (status,) = current.ok_or(RepoError::NotFound)?;
        patch.check_status(status)?;

        let sql = format!(
            "UPDATE posts SET \
                title = COALESCE($3, title), \
                content = COALESCE($4, content), \
                status = COALESCE($5, status), \
                featured_image_url = COALESCE($6, featured_image_url), \
                wordpress_id = COALESCE($7, wordpress_id), \
                wordpress_link = COALESCE($8, wordpress_link), \
                updated_at = now() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(patch.title)
            .bind(patch.content)
            .bind(patch.status)
            .bind(patch.featured_image_url)
            .bind(patch.wordpress_id)
            .bind(patch.wordpress_link)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let sources = Self::fetch_sources(&mut *tx, id).await?;
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into_record(sources))
    }

    pub(super) async fn remove_post(&self, owner: &str, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

async fn insert_sources(
    tx: &mut Transaction<'_, Postgres>,
    post_id: i64,
    sources: &[ResearchSource],
) -> Result<(), RepoError> {
    if sources.is_empty() {
        return Ok(());
    }

    let mut qb =
        QueryBuilder::<Postgres>::new("INSERT INTO sources (post_id, position, title, uri) ");
    qb.push_values(sources.iter().enumerate(), |mut row, (position, source)| {
        row.push_bind(post_id)
            .push_bind(position as i32)
            .push_bind(&source.title)
            .push_bind(&source.uri);
    });
    qb.build()
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}
