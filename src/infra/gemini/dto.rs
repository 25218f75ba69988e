//! Wire types for the `generateContent` and `predict` endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::ports::Citation;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    pub(crate) contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    pub(crate) fn prompt(text: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text }],
            }],
            tools: None,
            generation_config: None,
        }
    }

    pub(crate) fn with_search(mut self) -> Self {
        self.tools = Some(vec![Tool {
            google_search: GoogleSearch {},
        }]);
        self
    }

    pub(crate) fn with_json_schema(mut self, schema: Value) -> Self {
        self.generation_config = Some(GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        });
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub(crate) role: &'static str,
    pub(crate) parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Part<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Tool {
    pub(crate) google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub(crate) response_mime_type: &'static str,
    pub(crate) response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GenerateContentResponse {
    pub(crate) candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Candidate {
    pub(crate) content: Option<CandidateContent>,
    pub(crate) grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CandidateContent {
    pub(crate) parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ResponsePart {
    pub(crate) text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GroundingMetadata {
    pub(crate) grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GroundingChunk {
    pub(crate) web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WebChunk {
    pub(crate) uri: Option<String>,
    pub(crate) title: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Web citations of the first candidate; chunks without a `web` entry are skipped.
    pub(crate) fn citations(&self) -> Vec<Citation> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.grounding_metadata.as_ref())
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .map(|web| Citation {
                        title: web.title.clone(),
                        uri: web.uri.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest<'a> {
    pub(crate) instances: Vec<PredictInstance<'a>>,
    pub(crate) parameters: PredictParameters,
}

impl<'a> PredictRequest<'a> {
    pub(crate) fn single_wide_image(prompt: &'a str) -> Self {
        Self {
            instances: vec![PredictInstance { prompt }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "16:9",
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictInstance<'a> {
    pub(crate) prompt: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PredictParameters {
    pub(crate) sample_count: u8,
    pub(crate) aspect_ratio: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PredictResponse {
    pub(crate) predictions: Vec<Prediction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Prediction {
    pub(crate) bytes_base64_encoded: Option<String>,
    pub(crate) mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn grounded_request_enables_search() {
        let request = GenerateContentRequest::prompt("hi").with_search();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tools"], json!([{ "googleSearch": {} }]));
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_and_citations_tolerate_missing_fields() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "- a" }, { "text": "\n- b" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example", "title": "A" } },
                        { "retrievedContext": {} },
                        { "web": {} }
                    ]
                }
            }]
        }))
        .unwrap();

        assert_eq!(response.text(), "- a\n- b");
        let citations = response.citations();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].title.as_deref(), Some("A"));
        assert_eq!(citations[1], Citation::default());

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), "");
        assert!(empty.citations().is_empty());
    }
}
