//! WordPress connection settings and endpoint derivation.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::DomainError;

const USERS_ME_PATH: &str = "wp-json/wp/v2/users/me";
const POSTS_PATH: &str = "wp-json/wp/v2/posts";
const ADMIN_POSTS_PATH: &str = "wp-admin/edit.php";
pub const PASSWORD_MASK: &str = "********";

/// Credentials for one WordPress site.
///
/// `is_connected` only becomes true after a successful validation round-trip and
/// is cleared whenever the site URL, username, or password changes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WordPressSettings {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
    pub is_connected: bool,
}

impl std::fmt::Debug for WordPressSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordPressSettings")
            .field("site_url", &self.site_url)
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .field("is_connected", &self.is_connected)
            .finish()
    }
}

impl WordPressSettings {
    pub fn new(
        site_url: impl Into<String>,
        username: impl Into<String>,
        app_password: impl Into<String>,
    ) -> Self {
        Self {
            site_url: site_url.into(),
            username: username.into(),
            app_password: app_password.into(),
            is_connected: false,
        }
    }

    /// Apply new credentials. Any change drops the connected flag until revalidated.
    ///
    /// A password equal to the mask handed out by [`WordPressSettings::masked`]
    /// keeps the stored one.
    pub fn edited(&self, site_url: &str, username: &str, app_password: &str) -> Self {
        let app_password = if app_password == PASSWORD_MASK {
            self.app_password.as_str()
        } else {
            app_password
        };
        let unchanged = self.site_url == site_url
            && self.username == username
            && self.app_password == app_password;
        Self {
            site_url: site_url.to_string(),
            username: username.to_string(),
            app_password: app_password.to_string(),
            is_connected: unchanged && self.is_connected,
        }
    }

    pub fn with_connected(mut self, connected: bool) -> Self {
        self.is_connected = connected;
        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.site_url.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.app_password.trim().is_empty()
    }

    /// Normalized site root: trailing slashes removed, `https://` assumed when no scheme.
    pub fn site_root(&self) -> Result<Url, DomainError> {
        let trimmed = self.site_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DomainError::validation("site URL is empty"));
        }
        let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            format!("{trimmed}/")
        } else {
            format!("https://{trimmed}/")
        };
        Url::parse(&candidate)
            .map_err(|err| DomainError::validation(format!("invalid site URL `{trimmed}`: {err}")))
    }

    pub fn users_me_endpoint(&self) -> Result<Url, DomainError> {
        self.join(USERS_ME_PATH)
    }

    pub fn posts_endpoint(&self) -> Result<Url, DomainError> {
        self.join(POSTS_PATH)
    }

    /// Link returned when the API omits one for a new draft.
    pub fn admin_fallback_link(&self) -> Result<Url, DomainError> {
        self.join(ADMIN_POSTS_PATH)
    }

    fn join(&self, path: &str) -> Result<Url, DomainError> {
        self.site_root()?
            .join(path)
            .map_err(|err| DomainError::validation(format!("invalid endpoint: {err}")))
    }

    /// Copy safe to hand to a client: the password is replaced by a marker.
    pub fn masked(&self) -> Self {
        let app_password = if self.app_password.is_empty() {
            String::new()
        } else {
            PASSWORD_MASK.to_string()
        };
        Self {
            app_password,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_empty_and_disconnected() {
        let settings = WordPressSettings::default();
        assert!(!settings.has_credentials());
        assert!(!settings.is_connected);
    }

    #[test]
    fn editing_any_field_resets_connection() {
        let connected =
            WordPressSettings::new("blog.example.com", "ana", "abcd efgh").with_connected(true);

        let same = connected.edited("blog.example.com", "ana", "abcd efgh");
        assert!(same.is_connected);

        let changed = connected.edited("blog.example.com", "ana", "new pass");
        assert!(!changed.is_connected);
        assert_eq!(changed.app_password, "new pass");
    }

    #[test]
    fn site_root_adds_scheme_and_strips_trailing_slash() {
        let settings = WordPressSettings::new("blog.example.com//", "u", "p");
        assert_eq!(
            settings.posts_endpoint().unwrap().as_str(),
            "https://blog.example.com/wp-json/wp/v2/posts"
        );

        let settings = WordPressSettings::new("http://localhost:8080/wp", "u", "p");
        assert_eq!(
            settings.users_me_endpoint().unwrap().as_str(),
            "http://localhost:8080/wp/wp-json/wp/v2/users/me"
        );
        assert_eq!(
            settings.admin_fallback_link().unwrap().as_str(),
            "http://localhost:8080/wp/wp-admin/edit.php"
        );
    }

    #[test]
    fn blank_site_url_is_invalid() {
        assert!(WordPressSettings::default().site_root().is_err());
    }

    #[test]
    fn masked_hides_password_and_debug_redacts() {
        let settings = WordPressSettings::new("s", "u", "secret");
        assert_eq!(settings.masked().app_password, PASSWORD_MASK);
        let echoed = settings.edited(&settings.site_url, &settings.username, PASSWORD_MASK);
        assert_eq!(echoed.app_password, settings.app_password);
        assert!(!format!("{settings:?}").contains("secret"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(WordPressSettings::new("s", "u", "p")).unwrap();
        assert_eq!(value["siteUrl"], "s");
        assert_eq!(value["appPassword"], "p");
        assert_eq!(value["isConnected"], false);
    }
}
