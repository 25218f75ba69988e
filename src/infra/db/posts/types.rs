use sqlx::types::Json;
use time::OffsetDateTime;

use crate::domain::entities::{PostRecord, PostSummary};
use crate::domain::research::{ResearchSource, TrendAnalysis};
use crate::domain::types::PostStatus;

pub(crate) const POST_COLUMNS: &str = "id, user_id, title, content, status, research_summary, \
    trend_analysis, featured_image_url, wordpress_id, wordpress_link, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) user_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) status: PostStatus,
    pub(crate) research_summary: Option<String>,
    pub(crate) trend_analysis: Option<Json<TrendAnalysis>>,
    pub(crate) featured_image_url: Option<String>,
    pub(crate) wordpress_id: Option<i64>,
    pub(crate) wordpress_link: Option<String>,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl PostRow {
    pub(crate) fn into_record(self, sources: Vec<ResearchSource>) -> PostRecord {
        PostRecord {
            id: self.id,
            title: self.title,
            content: self.content,
            status: self.status,
            research_summary: self.research_summary,
            trend_analysis: self.trend_analysis.map(|Json(analysis)| analysis),
            sources,
            featured_image_url: self.featured_image_url,
            wordpress_id: self.wordpress_id,
            wordpress_link: self.wordpress_link,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user_id: self.user_id,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PostSummaryRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) status: PostStatus,
    pub(crate) wordpress_link: Option<String>,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostSummaryRow> for PostSummary {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            status: row.status,
            wordpress_link: row.wordpress_link,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SourceRow {
    pub(crate) title: String,
    pub(crate) uri: String,
}

impl From<SourceRow> for ResearchSource {
    fn from(row: SourceRow) -> Self {
        Self {
            title: row.title,
            uri: row.uri,
        }
    }
}
