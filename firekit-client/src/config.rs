//! Configuration loading for firekit.
//!
//! Configuration is loaded from a TOML file (default: `firekit.toml`).
//! Every table and field is optional.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the emulator host.
pub const EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";

/// Environment variable naming the default project.
pub const PROJECT_VAR: &str = "GOOGLE_CLOUD_PROJECT";

/// Root configuration for firekit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Application identity and credentials.
    #[serde(default)]
    pub app: AppConfig,
    /// HTTP client options.
    #[serde(default)]
    pub client: ClientOptions,
}

/// Application identity and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Platform project id. Required by the service factories, not by init.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Document database id (default: `(default)`).
    #[serde(default = "default_database_id")]
    pub database_id: String,
    /// Where the bearer token comes from.
    #[serde(default)]
    pub credentials: Credentials,
}

/// Source of the bearer access token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// A literal access token.
    AccessToken {
        /// OAuth2 access token.
        token: String,
    },
    /// Read the token from an environment variable at init.
    Environment {
        /// Variable name (default: `GOOGLE_OAUTH_ACCESS_TOKEN`).
        #[serde(default = "default_token_var")]
        var: String,
    },
    /// Local emulator, which accepts the fixed `owner` token.
    Emulator,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken { .. } => f
                .debug_struct("AccessToken")
                .field("token", &"[REDACTED]")
                .finish(),
            Credentials::Environment { var } => {
                f.debug_struct("Environment").field("var", var).finish()
            }
            Credentials::Emulator => f.write_str("Emulator"),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials::Environment {
            var: default_token_var(),
        }
    }
}

/// HTTP client options.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientOptions {
    /// Document store API base URL.
    #[serde(default = "default_firestore_endpoint")]
    pub firestore_endpoint: String,
    /// Messaging API base URL.
    #[serde(default = "default_messaging_endpoint")]
    pub messaging_endpoint: String,
    /// Per-request timeout in seconds (default: 30). `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// `host:port` of a local document store emulator.
    /// When set, store requests go to `http://{host}` with the `owner` token.
    #[serde(default)]
    pub firestore_emulator_host: Option<String>,
}

// Default value functions
fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_token_var() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".to_string()
}

fn default_firestore_endpoint() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_messaging_endpoint() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("firekit/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database_id: default_database_id(),
            credentials: Credentials::default(),
        }
    }
}

impl AppConfig {
    /// Config for `project_id` with default database and credentials.
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: Some(project_id.to_string()),
            ..Self::default()
        }
    }

    /// Replace the credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            firestore_endpoint: default_firestore_endpoint(),
            messaging_endpoint: default_messaging_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            firestore_emulator_host: None,
        }
    }
}

impl ClientOptions {
    /// Request timeout, or `None` when `timeout_secs` is 0.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Overlay `FIRESTORE_EMULATOR_HOST` from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(host) = lookup(EMULATOR_HOST_VAR).filter(|h| !h.is_empty()) {
            self.firestore_emulator_host = Some(host);
        }
        self
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay environment variables: the emulator host, and
    /// `GOOGLE_CLOUD_PROJECT` when no project id is configured.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if self.app.project_id.is_none() {
            self.app.project_id = lookup(PROJECT_VAR).filter(|p| !p.is_empty());
        }
        self.client = self.client.apply_env_from(lookup);
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
