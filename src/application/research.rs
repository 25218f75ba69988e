//! Grounded topic research followed by structured trend analysis.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, warn};

use crate::application::ports::{GenerativeModel, ModelError};
use crate::application::upstream::observe;
use crate::domain::research::{
    EMPTY_SUMMARY, ResearchResult, ResearchSource, SUGGESTED_TOPIC_COUNT, Topic, TrendAnalysis,
};

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("failed to research topic: {0}")]
    Grounding(#[source] ModelError),
}

#[derive(Clone)]
pub struct ResearchService {
    model: Arc<dyn GenerativeModel>,
}

impl ResearchService {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Research `topic` and analyze the findings.
    ///
    /// A failed grounding call fails the whole operation. A failed analysis call
    /// keeps the summary and sources and pairs them with an empty analysis.
    pub async fn research(&self, topic: &Topic) -> Result<ResearchResult, ResearchError> {
        let started_at = Instant::now();
        let grounded = self.model.grounded(&research_prompt(topic.as_str())).await;
        observe("research", started_at, &grounded);
        let grounded = grounded.map_err(ResearchError::Grounding)?;

        let summary = if grounded.text.trim().is_empty() {
            EMPTY_SUMMARY.to_string()
        } else {
            grounded.text
        };
        let sources: Vec<ResearchSource> = grounded
            .citations
            .iter()
            .map(|citation| {
                ResearchSource::from_citation(citation.title.as_deref(), citation.uri.as_deref())
            })
            .collect();

        let trend_analysis = self.analyze(&summary).await;
        info!(
            target = "trendpress::application::research",
            topic = topic.as_str(),
            sources = sources.len(),
            sentiment = trend_analysis.sentiment.as_str(),
            suggested = trend_analysis.suggested_topics.len(),
            "research completed"
        );

        Ok(ResearchResult {
            summary,
            sources,
            trend_analysis,
        })
    }

    async fn analyze(&self, summary: &str) -> TrendAnalysis {
        let started_at = Instant::now();
        let result = self
            .model
            .structured(&analysis_prompt(summary), analysis_schema())
            .await;
        observe("analyze", started_at, &result);

        match result {
            Ok(value) => TrendAnalysis::from_loose(&value),
            Err(err) => {
                warn!(
                    target = "trendpress::application::research",
                    error = %err,
                    "trend analysis failed; continuing with an empty analysis"
                );
                TrendAnalysis::empty()
            }
        }
    }
}

fn research_prompt(topic: &str) -> String {
    format!(
        "Research the following topic in depth: \"{topic}\".\n\n\
         Directives:\n\
         1. LATEST NEWS: Focus strictly on the most recent articles, news, and updates \
         from the web (for example the last 30 days where applicable).\n\
         2. DATES: For every key finding you list, explicitly mention the publication \
         date of the source article (for example \"As reported on Oct 15, 2024...\").\n\
         3. Summarize the key findings in bullet points suitable for a blog post outline."
    )
}

fn analysis_prompt(summary: &str) -> String {
    format!(
        "Analyze the following research notes as a content strategist.\n\n\
         {summary}\n\n\
         Return the overall sentiment (positive, neutral, or negative), the key dated \
         events, the names of the news outlets and of the social platforms that drive \
         the coverage, and exactly {SUGGESTED_TOPIC_COUNT} suggested blog post titles, \
         each with a one-sentence rationale."
    )
}

fn analysis_schema() -> Value {
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "sentiment": {
                "type": "STRING",
                "enum": ["positive", "neutral", "negative"]
            },
            "key_events": strings,
            "sources_news": strings,
            "sources_social": strings,
            "suggested_topics": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "rationale": { "type": "STRING" }
                    },
                    "required": ["title", "rationale"]
                }
            }
        },
        "required": [
            "sentiment",
            "key_events",
            "sources_news",
            "sources_social",
            "suggested_topics"
        ]
    })
}
