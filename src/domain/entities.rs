//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::{
    research::{ResearchResult, ResearchSource, TrendAnalysis},
    types::PostStatus,
};

/// A saved workflow session, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub research_summary: Option<String>,
    pub trend_analysis: Option<TrendAnalysis>,
    pub sources: Vec<ResearchSource>,
    pub featured_image_url: Option<String>,
    pub wordpress_id: Option<i64>,
    pub wordpress_link: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub user_id: String,
}

impl PostRecord {
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Research stored on the record, when both the summary and the analysis exist.
    pub fn research(&self) -> Option<ResearchResult> {
        let summary = self.research_summary.as_ref()?;
        let analysis = self.trend_analysis.as_ref()?;
        Some(ResearchResult {
            summary: summary.clone(),
            sources: self.sources.clone(),
            trend_analysis: analysis.clone(),
        })
    }
}

/// Sidebar listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub status: PostStatus,
    pub wordpress_link: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&PostRecord> for PostSummary {
    fn from(record: &PostRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            status: record.status,
            wordpress_link: record.wordpress_link.clone(),
            updated_at: record.updated_at,
        }
    }
}
