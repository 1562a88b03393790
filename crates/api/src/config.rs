use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub assets: AssetsConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body, including thumbnail uploads.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Send Strict-Transport-Security. Only behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding stored thumbnails.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Base URL that signed thumbnail links are issued against.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// HMAC key for signed thumbnail links.
    #[serde(default)]
    pub signing_secret: String,

    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,

    /// Edge length of the square thumbnails, in pixels.
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

impl AssetsConfig {
    pub fn url_ttl(&self) -> Duration {
        Duration::from_secs(self.url_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Upper bound for each asset store call and storage statement.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            operation_timeout_secs: default_operation_timeout(),
        }
    }
}

impl WorkflowConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_jobs_enabled")]
    pub enabled: bool,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: default_jobs_enabled(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_body_size() -> usize {
    10 * 1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_storage_dir() -> String {
    "data/assets".to_string()
}
fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
/// Longest lifetime a signed asset URL may be issued for (7 days).
const MAX_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

fn default_url_ttl() -> u64 {
    3600
}
fn default_thumbnail_size() -> u32 {
    150
}
fn default_operation_timeout() -> u64 {
    10
}
fn default_jobs_enabled() -> bool {
    true
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PICKUP__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("PICKUP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration from embedded defaults plus `overrides`.
    ///
    /// Does not touch the file system and skips validation, so tests can
    /// build partial configs.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "127.0.0.1"
            port = 8080
            request_timeout_secs = 30
            max_body_size = 10485760

            [database]
            url = ""
            max_connections = 5
            min_connections = 1
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "debug"
            format = "pretty"

            [security]
            cors_origins = []
            hsts_enabled = false

            [assets]
            storage_dir = "data/test-assets"
            public_base_url = "http://localhost:8080"
            signing_secret = "test-signing-secret"
            url_ttl_secs = 3600
            thumbnail_size = 150

            [workflow]
            operation_timeout_secs = 5

            [jobs]
            enabled = false
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PICKUP__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.assets.signing_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "PICKUP__ASSETS__SIGNING_SECRET environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.assets.thumbnail_size == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "thumbnail_size must be positive".to_string(),
            ));
        }

        if self.assets.url_ttl_secs == 0 || self.assets.url_ttl_secs > MAX_URL_TTL_SECS {
            return Err(ConfigValidationError::InvalidValue(format!(
                "url_ttl_secs must be between 1 and {MAX_URL_TTL_SECS}"
            )));
        }

        if self.workflow.operation_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "operation_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
