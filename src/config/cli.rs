use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the trendpress binary.
#[derive(Debug, Parser)]
#[command(
    name = "trendpress",
    version,
    about = "Trend research and blog drafting workflow"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TRENDPRESS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Run the workflow once for a topic and print the resulting session as JSON.
    Generate(GenerateArgs),
    /// Apply database migrations.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the Gemini text model.
    #[arg(long = "gemini-text-model", value_name = "MODEL")]
    pub gemini_text_model: Option<String>,

    /// Override the Gemini image model.
    #[arg(long = "gemini-image-model", value_name = "MODEL")]
    pub gemini_image_model: Option<String>,

    /// Override the settings file location.
    #[arg(long = "settings-store-path", value_name = "PATH")]
    pub settings_store_path: Option<PathBuf>,

    /// Override the rate limit window size.
    #[arg(long = "rate-limit-window-seconds", value_name = "SECONDS")]
    pub rate_limit_window_seconds: Option<u64>,

    /// Override the rate limit request ceiling.
    #[arg(long = "rate-limit-max-requests", value_name = "COUNT")]
    pub rate_limit_max_requests: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Topic or keywords to research.
    #[arg(long, value_name = "TOPIC")]
    pub topic: String,

    /// Index of the suggested topic to write about.
    #[arg(long, default_value_t = 0, value_name = "INDEX")]
    pub pick: usize,

    /// Send the finished article to WordPress as a draft.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub publish: bool,

    /// Owner recorded on the saved post.
    #[arg(long, default_value = "cli", value_name = "OWNER")]
    pub owner: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}
