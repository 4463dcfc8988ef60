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
const DEFAULT_JWT_EXPIRATION_SECS: u64 = 30 * 24 * 60 * 60; // 30 days
const DEFAULT_PAYMENT_SUCCESS_RATE: f64 = 0.9;
const DEFAULT_PAYMENT_LATENCY_MS: u64 = 1000;
const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 300;
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key (minimum 32 characters)
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds
    pub jwt_expiration: u64,

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

    /// Comma-separated allowed CORS origins; permissive when unset in development
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Fraction of mock payment attempts that succeed (0.0 - 1.0)
    #[serde(default = "default_payment_success_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub payment_success_rate: f64,

    /// Simulated payment gateway latency in milliseconds
    #[serde(default = "default_payment_latency_ms")]
    pub payment_latency_ms: u64,

    /// How often the overdue-booking sweep runs; 0 disables it
    #[serde(default = "default_expiry_sweep_interval_secs")]
    pub expiry_sweep_interval_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_payment_success_rate() -> f64 {
    DEFAULT_PAYMENT_SUCCESS_RATE
}

fn default_payment_latency_ms() -> u64 {
    DEFAULT_PAYMENT_LATENCY_MS
}

fn default_expiry_sweep_interval_secs() -> u64 {
    DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS
}

impl AppConfig {
    /// Construct a configuration directly; used by tests and tooling.
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: u64,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            cors_allowed_origins: None,
            payment_success_rate: default_payment_success_rate(),
            payment_latency_ms: default_payment_latency_ms(),
            expiry_sweep_interval_secs: default_expiry_sweep_interval_secs(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Load configuration from `config/{default,ENV}.toml` files and `APP__*`
/// environment variables, in that precedence order.
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

    let builder = Config::builder()
        .set_default("database_url", "sqlite://parkwise.db?mode=rwc")?
        .set_default("jwt_expiration", DEFAULT_JWT_EXPIRATION_SECS as i64)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("auto_migrate", true)?
        .set_default("payment_success_rate", DEFAULT_PAYMENT_SUCCESS_RATE)?
        .set_default("payment_latency_ms", DEFAULT_PAYMENT_LATENCY_MS as i64)?
        .set_default(
            "expiry_sweep_interval_secs",
            DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS as i64,
        )?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // jwt_secret has no production default; fall back only in development
    let mut cfg: AppConfig = match config.get_string("jwt_secret") {
        Ok(_) => config.try_deserialize()?,
        Err(_) if run_env == DEFAULT_ENV || run_env == "test" => {
            info!("jwt_secret not configured; using built-in development secret");
            let config = Config::builder()
                .add_source(config)
                .set_override("jwt_secret", DEV_DEFAULT_JWT_SECRET)?
                .build()?;
            config.try_deserialize()?
        }
        Err(_) => {
            return Err(AppConfigError::Validation(
                "jwt_secret must be set via APP__JWT_SECRET or a config file".to_string(),
            ))
        }
    };

    if cfg.environment.is_empty() {
        cfg.environment = run_env;
    }

    cfg.validate()
        .map_err(|e| AppConfigError::Validation(e.to_string()))?;

    Ok(cfg)
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default_directive = format!("parkwise_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    // A second init (tests) is fine; keep the first subscriber
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_construction_applies_defaults() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "test_secret_key_that_is_long_enough_for_validation".into(),
            3600,
            "127.0.0.1".into(),
            18080,
            "test".into(),
        );
        assert!(cfg.is_development());
        assert_eq!(cfg.payment_success_rate, DEFAULT_PAYMENT_SUCCESS_RATE);
        assert_eq!(cfg.payment_latency_ms, DEFAULT_PAYMENT_LATENCY_MS);
        assert!(cfg.auto_migrate);
    }

    #[test]
    fn short_jwt_secret_fails_validation() {
        let cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "short".into(),
            3600,
            "127.0.0.1".into(),
            18080,
            "test".into(),
        );
        assert!(cfg.validate().is_err());
    }
}
