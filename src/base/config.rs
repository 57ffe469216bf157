//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;
use tracing::warn;

use super::types::Res;

/// Default DuckDB extension that provides the query statement.
fn default_query_extension() -> String {
    "acp".to_string()
}

/// Default repository the extension is installed from.
fn default_query_extension_repository() -> String {
    "community".to_string()
}

/// Default statement keyword the prompt is appended to.
fn default_query_statement_prefix() -> String {
    "CLAUDE".to_string()
}

/// Configuration for the relay.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// The shared settings.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Settings, as read from the environment and optional file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack app-level token used for Socket Mode (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token used for Web API calls (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// DuckDB extension to install and load (`QUERY_EXTENSION`).
    #[serde(default = "default_query_extension")]
    pub query_extension: String,
    /// Repository to install the extension from (`QUERY_EXTENSION_REPOSITORY`).
    #[serde(default = "default_query_extension_repository")]
    pub query_extension_repository: String,
    /// Statement keyword placed before the prompt (`QUERY_STATEMENT_PREFIX`).
    #[serde(default = "default_query_statement_prefix")]
    pub query_statement_prefix: String,
}

impl Config {
    /// Load from the environment and, if given, an explicit TOML file.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default());

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        }

        Self::from_settings(cfg.build()?)
    }

    /// Deserialize and validate already-assembled settings.
    pub fn from_settings(settings: config::Config) -> Res<Self> {
        let result = Config {
            inner: Arc::new(settings.try_deserialize()?),
        };

        if result.slack_bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack bot token (`SLACK_BOT_TOKEN`) must be set."));
        }

        if result.slack_app_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack app token (`SLACK_APP_TOKEN`) must be set."));
        }

        if result.query_extension.trim().is_empty() || result.query_statement_prefix.trim().is_empty() {
            return Err(anyhow::anyhow!("Query extension and statement prefix must not be empty."));
        }

        if !result.slack_bot_token.starts_with("xoxb-") {
            warn!("Slack bot token does not look like a bot token (`xoxb-...`).");
        }

        if !result.slack_app_token.starts_with("xapp-") {
            warn!("Slack app token does not look like an app-level token (`xapp-...`).");
        }

        Ok(result)
    }
}
