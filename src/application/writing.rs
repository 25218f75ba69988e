//! Article writing from a chosen title and the research notes.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::application::ports::{GenerativeModel, ModelError};
use crate::application::upstream::observe;
use crate::domain::error::DomainError;
use crate::domain::posts::ArticleDraft;

#[derive(Debug, Error)]
pub enum WritingError {
    #[error("failed to generate content: {0}")]
    Model(#[source] ModelError),
    #[error("failed to generate content: response did not match the article shape: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("failed to generate content: {0}")]
    Invalid(#[source] DomainError),
}

#[derive(Clone)]
pub struct WritingService {
    model: Arc<dyn GenerativeModel>,
}

impl WritingService {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn write(
        &self,
        title: &str,
        research_summary: &str,
    ) -> Result<ArticleDraft, WritingError> {
        let started_at = Instant::now();
        let result = self
            .model
            .structured(&writing_prompt(title, research_summary), article_schema())
            .await;
        observe("write", started_at, &result);

        let value = result.map_err(WritingError::Model)?;
        if value.is_null() {
            return Err(WritingError::Model(ModelError::EmptyResponse));
        }
        let draft: ArticleDraft = serde_json::from_value(value).map_err(WritingError::Shape)?;
        let draft = draft.validated().map_err(WritingError::Invalid)?;

        info!(
            target = "trendpress::application::writing",
            title = %draft.title,
            content_len = draft.content.len(),
            "article written"
        );
        Ok(draft)
    }
}

fn writing_prompt(title: &str, research_summary: &str) -> String {
    format!(
        "You are a professional, empathetic, and witty blog writer. \
         Write a highly humanized blog post about: \"{title}\".\n\n\
         Use the following research notes (which include dates):\n\
         {research_summary}\n\n\
         Requirements:\n\
         1. Return the result as a JSON object.\n\
         2. \"title\": A catchy, click-worthy title.\n\
         3. \"content\": The full blog post body in HTML (use <h2>, <h3>, <p>, <ul>).\n\
         4. Tone: conversational, personal, and authoritative. Mix short and long sentences. \
         Avoid stiff transitions such as \"In conclusion\", \"Delving into\", or \
         \"In the rapidly evolving landscape\".\n\
         5. Timeliness: incorporate the dates found in the research so the reader sees \
         the content is fresh."
    )
}

fn article_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "content": { "type": "STRING" }
        },
        "required": ["title", "content"]
    })
}
