//! Generated posts, featured images, and publish results.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::research::ResearchSource;

/// Binary image returned by the image model.
#[derive(Clone, PartialEq, Eq)]
pub struct FeaturedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FeaturedImage {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.bytes)
        )
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (mime_type, payload) = rest.split_once(";base64,")?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some(Self::new(mime_type, bytes))
    }
}

impl std::fmt::Debug for FeaturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeaturedImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Title and HTML body returned by the writing model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
}

impl ArticleDraft {
    /// Enforce the generated-post invariants: a non-empty title and renderable HTML.
    pub fn validated(self) -> Result<Self, DomainError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("generated title is empty"));
        }
        Ok(Self {
            title: title.to_string(),
            content: sanitize_html(&self.content),
        })
    }
}

/// Clean model or user supplied HTML so it is safe to render directly.
pub fn sanitize_html(raw: &str) -> String {
    ammonia::clean(raw)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    pub research_summary: String,
    pub sources: Vec<ResearchSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordpress_link: Option<String>,
}

impl GeneratedPost {
    pub fn assemble(
        draft: ArticleDraft,
        research_summary: String,
        sources: Vec<ResearchSource>,
        image: Option<&FeaturedImage>,
    ) -> Self {
        Self {
            title: draft.title,
            content: draft.content,
            research_summary,
            sources,
            featured_image: image.map(FeaturedImage::to_data_uri),
            wordpress_link: None,
        }
    }
}

/// Identifier and edit link of a draft created on the remote WordPress site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub id: i64,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_round_trip() {
        let image = FeaturedImage::new("image/png", vec![0x89, b'P', b'N', b'G']);
        let uri = image.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(FeaturedImage::from_data_uri(&uri), Some(image));
        assert!(FeaturedImage::from_data_uri("https://example.com/a.png").is_none());
    }

    #[test]
    fn draft_validation_trims_title_and_strips_scripts() {
        let draft = ArticleDraft {
            title: "  5 Tools for Remote Teams  ".to_string(),
            content: "<h2>Intro</h2><script>alert(1)</script><p>Hi</p>".to_string(),
        }
        .validated()
        .unwrap();

        assert_eq!(draft.title, "5 Tools for Remote Teams");
        assert!(draft.content.contains("<h2>Intro</h2>"));
        assert!(!draft.content.contains("script"));
    }

    #[test]
    fn blank_title_is_rejected() {
        let draft = ArticleDraft {
            title: " ".to_string(),
            content: "<p>body</p>".to_string(),
        };
        assert!(draft.validated().is_err());
    }
}
