use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use validator::{Validate, ValidationError};

const CONFIG_DIR: &str = "config";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://distriplast.db?mode=rwc";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_COUNTRY_CODE: &str = "51";

/// Application configuration, loaded from defaults, optional TOML files
/// under `config/`, and `APP_`-prefixed environment variables (later
/// sources override earlier ones).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Connection string for the backing database. SQLite and Postgres
    /// URLs are both accepted.
    #[serde(default = "default_database_url")]
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Deployment environment name (`development`, `staging`, `production`).
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Base log level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit logs as JSON instead of human-readable lines.
    #[serde(default)]
    pub log_json: bool,

    /// Run pending schema migrations at startup.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow any origin. Refused outside development.
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Send `Access-Control-Allow-Credentials` on CORS responses.
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Maximum number of pooled database connections.
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// Minimum number of pooled database connections kept open.
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Seconds to wait when opening a new database connection.
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Seconds an idle pooled connection may live before being closed.
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    /// Seconds to wait for a free connection from the pool.
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Bound on the in-process event channel between services and the
    /// event consumer task.
    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,

    /// Page size applied when a list request does not specify one.
    #[serde(default = "default_api_default_page_size")]
    #[validate(range(min = 1))]
    pub api_default_page_size: u64,

    /// Upper bound on requested page sizes.
    #[serde(default = "default_api_max_page_size")]
    #[validate(range(min = 1))]
    pub api_max_page_size: u64,

    /// Country code prepended to local phone numbers when building
    /// WhatsApp links.
    #[serde(default = "default_whatsapp_country_code")]
    #[validate(length(min = 1))]
    pub whatsapp_country_code: String,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_auto_migrate() -> bool {
    true
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    10
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_api_default_page_size() -> u64 {
    20
}

fn default_api_max_page_size() -> u64 {
    100
}

fn default_whatsapp_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl AppConfig {
    /// Minimal constructor used by tests and tooling that bypass the
    /// layered loader.
    pub fn new(database_url: &str, host: &str, port: u16, environment: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            host: host.to_string(),
            port,
            environment: environment.to_string(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: default_auto_migrate(),
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            api_default_page_size: default_api_default_page_size(),
            api_max_page_size: default_api_max_page_size(),
            whatsapp_country_code: default_whatsapp_country_code(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .map(|origins| !origins.trim().is_empty())
            .unwrap_or(false)
    }

    /// Permissive CORS is only acceptable while developing locally.
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.cors_allow_any_origin && self.is_development()
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cross-field rules that `validator` cannot express per field.
    pub fn validate_additional_constraints(&self) -> Result<(), AppConfigError> {
        if self.cors_allow_any_origin && !self.is_development() {
            return Err(AppConfigError::Validation(
                "cors_allow_any_origin is only permitted in the development environment"
                    .to_string(),
            ));
        }
        if self.cors_allow_credentials && self.cors_allow_any_origin {
            return Err(AppConfigError::Validation(
                "cors_allow_credentials cannot be combined with cors_allow_any_origin"
                    .to_string(),
            ));
        }
        if self.db_min_connections > self.db_max_connections {
            return Err(AppConfigError::Validation(
                "db_min_connections cannot exceed db_max_connections".to_string(),
            ));
        }
        if self.api_default_page_size > self.api_max_page_size {
            return Err(AppConfigError::Validation(
                "api_default_page_size cannot exceed api_max_page_size".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration in layers: coded defaults, then `config/default.toml`,
/// then `config/{environment}.toml`, then `APP_`-prefixed environment
/// variables with `__` as the nesting separator. All file sources are
/// optional.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = std::env::var("RUN_ENV")
        .or_else(|_| std::env::var("APP_ENVIRONMENT"))
        .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string());

    let config = Config::builder()
        .set_default("environment", run_env.clone())?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config
        .validate()
        .map_err(|e| AppConfigError::Validation(e.to_string()))?;
    app_config.validate_additional_constraints()?;

    Ok(app_config)
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    let directives = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("distriplast_api={},tower_http=debug", level));
    let filter = EnvFilter::new(directives);

    let result = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if result.is_ok() {
        info!(level = %level, json = json, "tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(DEFAULT_DATABASE_URL, DEFAULT_HOST, DEFAULT_PORT, "development")
    }

    #[test]
    fn defaults_pass_validation() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert!(config.validate_additional_constraints().is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = base_config();
        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn permissive_cors_requires_development() {
        let mut config = base_config();
        config.cors_allow_any_origin = true;
        assert!(config.validate_additional_constraints().is_ok());
        assert!(config.should_allow_permissive_cors());

        config.environment = "production".to_string();
        assert!(config.validate_additional_constraints().is_err());
        assert!(!config.should_allow_permissive_cors());
    }

    #[test]
    fn credentials_with_any_origin_is_rejected() {
        let mut config = base_config();
        config.cors_allow_any_origin = true;
        config.cors_allow_credentials = true;
        assert!(config.validate_additional_constraints().is_err());
    }

    #[test]
    fn cors_origin_list_splits_and_trims() {
        let mut config = base_config();
        config.cors_allowed_origins =
            Some("https://tienda.distriplast.pe, https://admin.distriplast.pe ,".to_string());
        assert!(config.has_cors_allowed_origins());
        assert_eq!(
            config.cors_origin_list(),
            vec![
                "https://tienda.distriplast.pe".to_string(),
                "https://admin.distriplast.pe".to_string(),
            ]
        );
    }

    #[test]
    fn empty_origin_string_counts_as_unset() {
        let mut config = base_config();
        config.cors_allowed_origins = Some("   ".to_string());
        assert!(!config.has_cors_allowed_origins());
        assert!(config.cors_origin_list().is_empty());
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut config = base_config();
        config.db_min_connections = 20;
        assert!(config.validate_additional_constraints().is_err());
    }

    #[test]
    fn page_size_bounds_are_checked() {
        let mut config = base_config();
        config.api_default_page_size = 500;
        assert!(config.validate_additional_constraints().is_err());
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        let config = base_config();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }
}
