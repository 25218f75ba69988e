//! Shared domain enumerations aligned with persisted database enums.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Lifecycle of a persisted post record. Transitions run researching → draft → published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "post_status", rename_all = "snake_case")]
pub enum PostStatus {
    Researching,
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Researching => "researching",
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    fn rank(self) -> u8 {
        match self {
            PostStatus::Researching => 0,
            PostStatus::Draft => 1,
            PostStatus::Published => 2,
        }
    }

    /// Whether moving from `self` to `next` keeps the one-directional lifecycle.
    pub fn can_advance_to(self, next: PostStatus) -> bool {
        next.rank() >= self.rank()
    }

    pub fn ensure_advance(self, next: PostStatus) -> Result<(), DomainError> {
        if self.can_advance_to(next) {
            Ok(())
        } else {
            Err(DomainError::StatusRegression {
                from: self.as_str(),
                to: next.as_str(),
            })
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall tone of the coverage gathered for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Parse a loosely-typed label. Anything outside the three known values is neutral.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl Display for Sentiment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
