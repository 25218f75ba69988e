//! JSON file holding the WordPress settings under a single namespaced key.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::application::repos::{RepoError, SettingsRepo};
use crate::domain::wordpress::WordPressSettings;

/// Key of the settings entry inside the file.
pub const SETTINGS_KEY: &str = "wp_settings";

#[derive(Debug, Clone)]
pub struct FileSettingsRepo {
    path: Arc<PathBuf>,
}

impl FileSettingsRepo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, Value>, RepoError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| RepoError::InvalidInput {
            message: format!("settings file `{}` is not valid JSON: {err}", path.display()),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(err) => Err(RepoError::from_persistence(err)),
    }
}

/// Replace the file atomically: write a sibling temp file, then rename over the target.
fn write_entries(path: &Path, entries: &BTreeMap<String, Value>) -> Result<(), RepoError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(RepoError::from_persistence)?;

    let encoded = serde_json::to_vec_pretty(entries).map_err(RepoError::from_persistence)?;
    let mut file = NamedTempFile::new_in(dir).map_err(RepoError::from_persistence)?;
    file.write_all(&encoded).map_err(RepoError::from_persistence)?;
    file.flush().map_err(RepoError::from_persistence)?;
    file.persist(path).map_err(|err| RepoError::from_persistence(err.error))?;
    Ok(())
}

#[async_trait]
impl SettingsRepo for FileSettingsRepo {
    async fn read_settings(&self) -> Result<Option<WordPressSettings>, RepoError> {
        let path = self.path.clone();
        let entries = tokio::task::spawn_blocking(move || read_entries(&path))
            .await
            .map_err(RepoError::from_persistence)??;

        match entries.get(SETTINGS_KEY) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|err| RepoError::InvalidInput {
                    message: format!("stored settings are malformed: {err}"),
                }),
            None => Ok(None),
        }
    }

    async fn write_settings(&self, settings: &WordPressSettings) -> Result<(), RepoError> {
        let value = serde_json::to_value(settings).map_err(RepoError::from_persistence)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut entries = read_entries(&path)?;
            entries.insert(SETTINGS_KEY.to_string(), value);
            write_entries(&path, &entries)
        })
        .await
        .map_err(RepoError::from_persistence)??;

        debug!(
            target = "trendpress::infra::settings_file",
            path = %self.path.display(),
            "settings written"
        );
        Ok(())
    }
}
