//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::*;

use std::{
    collections::BTreeMap, net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "trendpress";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 3600;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_WORDPRESS_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SETTINGS_STORE_PATH: &str = "trendpress-settings.json";
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub gemini: GeminiSettings,
    pub wordpress: WordPressClientSettings,
    pub settings_store: SettingsStoreSettings,
    pub auth: AuthSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    /// Live sessions untouched for this long are dropped from the registry.
    pub session_idle_ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// `None` keeps posts in memory.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// HTTP behaviour of the WordPress client. Site credentials live in the settings store.
#[derive(Debug, Clone)]
pub struct WordPressClientSettings {
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SettingsStoreSettings {
    pub path: PathBuf,
}

/// Bearer tokens mapped to the owner they authenticate.
#[derive(Clone, Default)]
pub struct AuthSettings {
    pub tokens: BTreeMap<String, String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("owners", &self.tokens.values().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub window_seconds: NonZeroU32,
    pub max_requests: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("TRENDPRESS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Generate(args)) => raw.apply_database_override(&args.database),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    gemini: RawGeminiSettings,
    wordpress: RawWordPressSettings,
    settings_store: RawSettingsStoreSettings,
    auth: RawAuthSettings,
    rate_limit: RawRateLimitSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_database_override(&overrides.database);
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(model) = overrides.gemini_text_model.as_ref() {
            self.gemini.text_model = Some(model.clone());
        }
        if let Some(model) = overrides.gemini_image_model.as_ref() {
            self.gemini.image_model = Some(model.clone());
        }
        if let Some(path) = overrides.settings_store_path.as_ref() {
            self.settings_store.path = Some(path.clone());
        }
        if let Some(window) = overrides.rate_limit_window_seconds {
            self.rate_limit.window_seconds = Some(window);
        }
        if let Some(max) = overrides.rate_limit_max_requests {
            self.rate_limit.max_requests = Some(max);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            gemini,
            wordpress,
            settings_store,
            auth,
            rate_limit,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            gemini: build_gemini_settings(gemini)?,
            wordpress: build_wordpress_settings(wordpress)?,
            settings_store: build_settings_store_settings(settings_store)?,
            auth: build_auth_settings(auth)?,
            rate_limit: build_rate_limit_settings(rate_limit)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = non_zero_duration(graceful_secs, "server.graceful_shutdown_seconds")?;

    let idle_secs = server
        .session_idle_ttl_seconds
        .unwrap_or(DEFAULT_SESSION_IDLE_TTL_SECS);
    let session_idle_ttl = non_zero_duration(idle_secs, "server.session_idle_ttl_seconds")?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
        session_idle_ttl,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_gemini_settings(gemini: RawGeminiSettings) -> Result<GeminiSettings, LoadError> {
    let base_url =
        non_blank(gemini.base_url).unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
    url::Url::parse(&base_url)
        .map_err(|err| LoadError::invalid("gemini.base_url", format!("invalid URL: {err}")))?;

    let text_model =
        non_blank(gemini.text_model).unwrap_or_else(|| DEFAULT_GEMINI_TEXT_MODEL.to_string());
    let image_model =
        non_blank(gemini.image_model).unwrap_or_else(|| DEFAULT_GEMINI_IMAGE_MODEL.to_string());
    let request_timeout = non_zero_duration(
        gemini
            .request_timeout_seconds
            .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
        "gemini.request_timeout_seconds",
    )?;

    Ok(GeminiSettings {
        api_key: non_blank(gemini.api_key),
        base_url,
        text_model,
        image_model,
        request_timeout,
    })
}

fn build_wordpress_settings(
    wordpress: RawWordPressSettings,
) -> Result<WordPressClientSettings, LoadError> {
    let request_timeout = non_zero_duration(
        wordpress
            .request_timeout_seconds
            .unwrap_or(DEFAULT_WORDPRESS_TIMEOUT_SECS),
        "wordpress.request_timeout_seconds",
    )?;
    Ok(WordPressClientSettings { request_timeout })
}

fn build_settings_store_settings(
    store: RawSettingsStoreSettings,
) -> Result<SettingsStoreSettings, LoadError> {
    let path = store
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_STORE_PATH));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "settings_store.path",
            "path must not be empty",
        ));
    }
    Ok(SettingsStoreSettings { path })
}

fn build_auth_settings(auth: RawAuthSettings) -> Result<AuthSettings, LoadError> {
    let mut tokens = BTreeMap::new();
    for entry in auth.tokens {
        let token = entry.token.trim().to_string();
        let owner = entry.owner.trim().to_string();
        if token.is_empty() || owner.is_empty() {
            return Err(LoadError::invalid(
                "auth.tokens",
                "token and owner must not be empty",
            ));
        }
        if tokens.insert(token, owner).is_some() {
            return Err(LoadError::invalid(
                "auth.tokens",
                "the same token is listed twice",
            ));
        }
    }
    Ok(AuthSettings { tokens })
}

fn build_rate_limit_settings(
    rate_limit: RawRateLimitSettings,
) -> Result<RateLimitSettings, LoadError> {
    let window_seconds_val = rate_limit
        .window_seconds
        .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);
    let window_seconds = non_zero_u32(window_seconds_val, "rate_limit.window_seconds")?;

    let max_requests_val = rate_limit
        .max_requests
        .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    let max_requests = non_zero_u32(max_requests_val, "rate_limit.max_requests")?;

    Ok(RateLimitSettings {
        window_seconds,
        max_requests,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    session_idle_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGeminiSettings {
    api_key: Option<String>,
    base_url: Option<String>,
    text_model: Option<String>,
    image_model: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWordPressSettings {
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettingsStoreSettings {
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAuthSettings {
    tokens: Vec<RawTokenEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTokenEntry {
    token: String,
    owner: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRateLimitSettings {
    window_seconds: Option<u64>,
    max_requests: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_duration(seconds: u64, key: &'static str) -> Result<Duration, LoadError> {
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
