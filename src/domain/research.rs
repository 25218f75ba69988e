//! Research results and the trend analysis derived from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::types::Sentiment;

/// Title used for a grounding citation that carries none.
pub const DEFAULT_SOURCE_TITLE: &str = "Web Source";
/// URI used for a grounding citation that carries none.
pub const PLACEHOLDER_SOURCE_URI: &str = "#";
/// Summary used when the grounded call returns no text at all.
pub const EMPTY_SUMMARY: &str = "No research generated.";
/// Number of article angles requested from the analysis call.
pub const SUGGESTED_TOPIC_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSource {
    pub title: String,
    pub uri: String,
}

impl ResearchSource {
    /// Build a source from optional citation parts, filling the documented defaults.
    pub fn from_citation(title: Option<&str>, uri: Option<&str>) -> Self {
        let pick = |value: Option<&str>, fallback: &str| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            title: pick(title, DEFAULT_SOURCE_TITLE),
            uri: pick(uri, PLACEHOLDER_SOURCE_URI),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedTopic {
    pub title: String,
    pub rationale: String,
}

/// Older stored rows carry snake_case keys; both spellings deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub sentiment: Sentiment,
    #[serde(alias = "key_events")]
    pub key_events: Vec<String>,
    #[serde(alias = "sources_news")]
    pub sources_news: Vec<String>,
    #[serde(alias = "sources_social")]
    pub sources_social: Vec<String>,
    #[serde(alias = "suggested_topics")]
    pub suggested_topics: Vec<SuggestedTopic>,
}

impl TrendAnalysis {
    /// The analysis used when the structured analysis call fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::empty()
    }

    /// Normalize an untrusted model payload.
    ///
    /// Keys are accepted in snake_case (the model schema) or camelCase (a stored
    /// analysis). Unknown sentiment labels become neutral, missing or mistyped
    /// lists become empty, and suggested topics without a title are dropped.
    pub fn from_loose(value: &Value) -> Self {
        let sentiment = value
            .get("sentiment")
            .and_then(Value::as_str)
            .map(Sentiment::coerce)
            .unwrap_or_default();

        let suggested_topics = field(value, "suggested_topics", "suggestedTopics")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let title = item.get("title")?.as_str()?.trim();
                        if title.is_empty() {
                            return None;
                        }
                        let rationale = item
                            .get("rationale")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .trim();
                        Some(SuggestedTopic {
                            title: title.to_string(),
                            rationale: rationale.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            sentiment,
            key_events: string_list(value, "key_events", "keyEvents"),
            sources_news: string_list(value, "sources_news", "sourcesNews"),
            sources_social: string_list(value, "sources_social", "sourcesSocial"),
            suggested_topics,
        }
    }
}

fn field<'a>(value: &'a Value, snake: &str, camel: &str) -> Option<&'a Value> {
    value.get(snake).or_else(|| value.get(camel))
}

fn string_list(value: &Value, snake: &str, camel: &str) -> Vec<String> {
    field(value, snake, camel)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub summary: String,
    pub sources: Vec<ResearchSource>,
    pub trend_analysis: TrendAnalysis,
}

impl ResearchResult {
    pub fn suggested_topics(&self) -> &[SuggestedTopic] {
        &self.trend_analysis.suggested_topics
    }

    pub fn find_topic(&self, title: &str) -> Option<&SuggestedTopic> {
        self.suggested_topics()
            .iter()
            .find(|topic| topic.title == title)
    }
}

/// A research topic after trimming; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("topic must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn topic_rejects_blank_input() {
        assert!(Topic::parse("   ").is_err());
        assert_eq!(Topic::parse("  Remote Work ").unwrap().as_str(), "Remote Work");
    }

    #[test]
    fn citation_defaults_fill_missing_parts() {
        let source = ResearchSource::from_citation(None, Some(""));
        assert_eq!(source.title, DEFAULT_SOURCE_TITLE);
        assert_eq!(source.uri, PLACEHOLDER_SOURCE_URI);

        let source = ResearchSource::from_citation(Some("Wired"), Some("https://wired.com/a"));
        assert_eq!(source.title, "Wired");
        assert_eq!(source.uri, "https://wired.com/a");
    }

    #[test]
    fn loose_analysis_is_normalized() {
        let payload = json!({
            "sentiment": "ecstatic",
            "key_events": ["Launch on Oct 3", 42, ""],
            "sources_news": "not a list",
            "suggested_topics": [
                {"title": "Angle A", "rationale": "because"},
                {"title": "  "},
                {"rationale": "no title"},
                {"title": "Angle B"}
            ]
        });

        let analysis = TrendAnalysis::from_loose(&payload);
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
        assert_eq!(analysis.key_events, vec!["Launch on Oct 3".to_string()]);
        assert!(analysis.sources_news.is_empty());
        assert!(analysis.sources_social.is_empty());
        assert_eq!(analysis.suggested_topics.len(), 2);
        assert_eq!(analysis.suggested_topics[1].rationale, "");
    }

    #[test]
    fn empty_analysis_round_trips_through_json() {
        let encoded = serde_json::to_value(TrendAnalysis::empty()).unwrap();
        assert_eq!(encoded["sentiment"], "neutral");
        assert!(TrendAnalysis::from_loose(&encoded).is_empty());
    }

    #[test]
    fn analysis_serializes_in_camel_case_and_reads_either_spelling() {
        let analysis = TrendAnalysis {
            sentiment: Sentiment::Positive,
            key_events: vec!["Launch".to_string()],
            suggested_topics: vec![SuggestedTopic {
                title: "Angle".to_string(),
                rationale: "why".to_string(),
            }],
            ..TrendAnalysis::default()
        };

        let encoded = serde_json::to_value(&analysis).unwrap();
        assert_eq!(encoded["keyEvents"], json!(["Launch"]));
        assert_eq!(encoded["suggestedTopics"][0]["title"], "Angle");
        assert!(encoded.get("key_events").is_none());
        assert_eq!(TrendAnalysis::from_loose(&encoded), analysis);

        let stored = json!({
            "sentiment": "positive",
            "key_events": ["Launch"],
            "sources_news": [],
            "sources_social": [],
            "suggested_topics": [{"title": "Angle", "rationale": "why"}]
        });
        let decoded: TrendAnalysis = serde_json::from_value(stored).unwrap();
        assert_eq!(decoded, analysis);
    }
}
