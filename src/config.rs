use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CACHE_TYPE: &str = "redis";
const DEFAULT_FINALE_BASE_URL: &str = "https://app.finaleinventory.com";
const DEFAULT_FINALE_PAGE_SIZE: u32 = 2000;
const DEFAULT_FINALE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SYNC_BATCH_SIZE: usize = 100;
const DEFAULT_STUCK_SYNC_TIMEOUT_MINUTES: i64 = 30;

/// Cache configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Type of cache to use: "redis" or "in-memory"
    #[serde(default = "default_cache_type")]
    pub cache_type: String,

    /// TTL in seconds for the full inventory snapshot
    #[serde(default = "default_inventory_ttl")]
    pub inventory_ttl_secs: u64,

    /// TTL in seconds for the vendor snapshot
    #[serde(default = "default_vendors_ttl")]
    pub vendors_ttl_secs: u64,

    /// TTL in seconds for dashboard metric aggregates
    #[serde(default = "default_dashboard_ttl")]
    pub dashboard_ttl_secs: u64,

    /// TTL in seconds for the critical-items list
    #[serde(default = "default_critical_items_ttl")]
    pub critical_items_ttl_secs: u64,
}

fn default_cache_type() -> String {
    DEFAULT_CACHE_TYPE.to_string()
}
fn default_inventory_ttl() -> u64 {
    900
}
fn default_vendors_ttl() -> u64 {
    3600
}
fn default_dashboard_ttl() -> u64 {
    300
}
fn default_critical_items_ttl() -> u64 {
    900
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            inventory_ttl_secs: default_inventory_ttl(),
            vendors_ttl_secs: default_vendors_ttl(),
            dashboard_ttl_secs: default_dashboard_ttl(),
            critical_items_ttl_secs: default_critical_items_ttl(),
        }
    }
}

/// Finale Inventory upstream configuration. Credentials may be overridden at
/// runtime by the settings row; these values seed the client at startup.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FinaleConfig {
    /// Account path segment, e.g. "acme" in app.finaleinventory.com/acme/api
    #[serde(default)]
    pub account_path: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_secret: Option<String>,

    /// Base URL, overridable for tests
    #[serde(default = "default_finale_base_url")]
    pub base_url: String,

    /// Fixed page size for bulk product queries
    #[serde(default = "default_finale_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_finale_timeout")]
    pub timeout_secs: u64,

    /// Optional year filter for product queries
    #[serde(default)]
    pub filter_year: Option<i32>,

    /// Optional pivot-report URL. When set, inventory syncs pull from this
    /// report instead of the bulk product endpoint.
    #[serde(default)]
    pub report_url: Option<String>,
}

impl Default for FinaleConfig {
    fn default() -> Self {
        Self {
            account_path: None,
            api_key: None,
            api_secret: None,
            base_url: default_finale_base_url(),
            page_size: default_finale_page_size(),
            timeout_secs: default_finale_timeout(),
            filter_year: None,
            report_url: None,
        }
    }
}

fn default_finale_base_url() -> String {
    DEFAULT_FINALE_BASE_URL.to_string()
}
fn default_finale_page_size() -> u32 {
    DEFAULT_FINALE_PAGE_SIZE
}
fn default_finale_timeout() -> u64 {
    DEFAULT_FINALE_TIMEOUT_SECS
}

/// Sync orchestration knobs
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Rows per upsert batch
    #[serde(default = "default_sync_batch_size")]
    pub batch_size: usize,

    /// Minutes after which a `running` sync is considered stuck
    #[serde(default = "default_stuck_timeout")]
    pub stuck_timeout_minutes: i64,
}

fn default_sync_batch_size() -> usize {
    DEFAULT_SYNC_BATCH_SIZE
}
fn default_stuck_timeout() -> i64 {
    DEFAULT_STUCK_SYNC_TIMEOUT_MINUTES
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: default_sync_batch_size(),
            stuck_timeout_minutes: default_stuck_timeout(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL
    pub redis_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Maximum number of database connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Minimum number of database connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub finale: FinaleConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}

impl AppConfig {
    /// Minimal constructor used by tests and tools
    pub fn new(
        database_url: String,
        redis_url: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            redis_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            cache: CacheConfig::default(),
            finale: FinaleConfig::default(),
            sync: SyncConfig::default(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/{default,<env>}.toml` layered under
/// `APP__`-prefixed environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://stocksync.db?mode=rwc")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;

    Ok(app_config)
}

/// Initialize the tracing subscriber with an env-filter and optional JSON output.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("stocksync_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::try_new(filter_directive)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}
