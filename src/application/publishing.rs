//! WordPress connectivity checks and draft creation.

use std::sync::Arc;
use std::time::Instant;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::ports::{WordPressError, WordPressGateway};
use crate::application::upstream::observe;
use crate::domain::posts::PublishResult;
use crate::domain::wordpress::WordPressSettings;

const METRIC_PUBLISH: &str = "trendpress_publish_total";

/// Outcome of probing a WordPress site with the stored credentials.
///
/// Bad credentials and an unreachable site are reported separately so the user
/// knows whether to fix the password or the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ConnectionCheck {
    Connected,
    MissingCredentials,
    InvalidCredentials,
    Unreachable(String),
    Failed(String),
}

impl ConnectionCheck {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionCheck::Connected)
    }

    fn from_error(error: WordPressError) -> Self {
        match error {
            WordPressError::Unauthorized { .. } => ConnectionCheck::InvalidCredentials,
            WordPressError::Unreachable(reason) => ConnectionCheck::Unreachable(reason),
            WordPressError::Timeout => ConnectionCheck::Unreachable(error.to_string()),
            WordPressError::InvalidSiteUrl(reason) => ConnectionCheck::Unreachable(reason),
            other => ConnectionCheck::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("WordPress is not connected; save and validate the settings first")]
    NotConnected,
    #[error(transparent)]
    WordPress(#[from] WordPressError),
}

#[derive(Clone)]
pub struct PublishingService {
    gateway: Arc<dyn WordPressGateway>,
}

impl PublishingService {
    pub fn new(gateway: Arc<dyn WordPressGateway>) -> Self {
        Self { gateway }
    }

    pub async fn validate_connection(&self, settings: &WordPressSettings) -> ConnectionCheck {
        if !settings.has_credentials() {
            return ConnectionCheck::MissingCredentials;
        }

        let started_at = Instant::now();
        let result = self.gateway.current_user(settings).await;
        observe("wp_validate", started_at, &result);

        let check = match result {
            Ok(()) => ConnectionCheck::Connected,
            Err(err) => ConnectionCheck::from_error(err),
        };
        info!(
            target = "trendpress::application::publishing",
            site = %settings.site_url,
            outcome = ?check,
            "WordPress connection checked"
        );
        check
    }

    /// Create a draft post. Failures are always surfaced; nothing is simulated.
    pub async fn draft_post(
        &self,
        settings: &WordPressSettings,
        title: &str,
        content: &str,
    ) -> Result<PublishResult, PublishError> {
        if !settings.is_connected {
            return Err(PublishError::NotConnected);
        }

        let started_at = Instant::now();
        let result = self.gateway.create_draft(settings, title, content).await;
        observe("wp_draft", started_at, &result);

        let created = match result {
            Ok(created) => created,
            Err(err) => {
                counter!(METRIC_PUBLISH, "outcome" => "error").increment(1);
                warn!(
                    target = "trendpress::application::publishing",
                    site = %settings.site_url,
                    error = %err,
                    "draft creation failed"
                );
                return Err(err.into());
            }
        };

        let link = match created.link.filter(|link| !link.trim().is_empty()) {
            Some(link) => link,
            None => settings
                .admin_fallback_link()
                .map_err(|err| WordPressError::InvalidSiteUrl(err.to_string()))?
                .to_string(),
        };
        counter!(METRIC_PUBLISH, "outcome" => "ok").increment(1);
        info!(
            target = "trendpress::application::publishing",
            wordpress_id = created.id,
            link = %link,
            "draft created"
        );

        Ok(PublishResult {
            id: created.id,
            link,
        })
    }
}
