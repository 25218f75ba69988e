use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::application::publishing::{ConnectionCheck, PublishingService};
use crate::application::repos::{RepoError, SettingsRepo};
use crate::domain::wordpress::WordPressSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to persist settings: {0}")]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct SettingsUpdate {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

/// In-memory copy of the WordPress settings backed by a durable store.
///
/// Shared by every session; written only through [`SettingsService::save`] and
/// [`SettingsService::save_and_validate`].
#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepo>,
    publishing: PublishingService,
    current: Arc<RwLock<WordPressSettings>>,
}

impl SettingsService {
    /// Read the stored settings once. A missing or unreadable entry yields the empty default.
    pub async fn load(repo: Arc<dyn SettingsRepo>, publishing: PublishingService) -> Self {
        let initial = match repo.read_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => WordPressSettings::default(),
            Err(err) => {
                warn!(
                    target = "trendpress::application::settings",
                    error = %err,
                    "stored settings unreadable; starting disconnected"
                );
                WordPressSettings::default()
            }
        };
        Self {
            repo,
            publishing,
            current: Arc::new(RwLock::new(initial)),
        }
    }

    pub async fn current(&self) -> WordPressSettings {
        self.current.read().await.clone()
    }

    /// Persist first, then replace the in-memory copy.
    pub async fn save(&self, settings: WordPressSettings) -> Result<(), SettingsError> {
        let mut guard = self.current.write().await;
        self.repo.write_settings(&settings).await?;
        *guard = settings;
        Ok(())
    }

    /// Apply edited credentials, probe the site, and store the result with the
    /// connected flag set from the probe.
    pub async fn save_and_validate(
        &self,
        update: SettingsUpdate,
    ) -> Result<(WordPressSettings, ConnectionCheck), SettingsError> {
        let edited = self.current().await.edited(
            update.site_url.trim(),
            update.username.trim(),
            &update.app_password,
        );
        let check = self.publishing.validate_connection(&edited).await;
        let settings = edited.with_connected(check.is_connected());
        self.save(settings.clone()).await?;
        info!(
            target = "trendpress::application::settings",
            site = %settings.site_url,
            connected = settings.is_connected,
            "settings saved"
        );
        Ok((settings, check))
    }
}
