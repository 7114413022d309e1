use crate::app_config::{AppConfig, Environment};
use crate::campaigns::{load_campaigns, CampaignsFile};
use crate::thresholds::{load_thresholds, ThresholdsConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset for optional URLs and keys.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PMAX_ENV", "development"))?;
    let log_level = or_default("PMAX_LOG_LEVEL", "info");
    let thresholds_path = PathBuf::from(or_default(
        "PMAX_THRESHOLDS_PATH",
        "./config/thresholds.yaml",
    ));
    let campaigns_path = PathBuf::from(or_default(
        "PMAX_CAMPAIGNS_PATH",
        "./config/campaigns.yaml",
    ));

    let notify_webhook_url = optional("PMAX_NOTIFY_WEBHOOK_URL");
    let generator_url = optional("PMAX_GENERATOR_URL");
    let generator_api_key = optional("PMAX_GENERATOR_API_KEY");

    let relay_timeout_secs = parse_u64("PMAX_RELAY_TIMEOUT_SECS", "30")?;
    let relay_max_retries = parse_u32("PMAX_RELAY_MAX_RETRIES", "2")?;
    let relay_backoff_base_ms = parse_u64("PMAX_RELAY_BACKOFF_BASE_MS", "1000")?;

    let db_max_connections = parse_u32("PMAX_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("PMAX_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PMAX_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        thresholds_path,
        campaigns_path,
        notify_webhook_url,
        generator_url,
        generator_api_key,
        relay_timeout_secs,
        relay_max_retries,
        relay_backoff_base_ms,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PMAX_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Threshold and campaign definitions for one review run.
///
/// Loaded once at run start and passed by reference into every component;
/// nothing reads configuration from ambient state mid-run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub thresholds: ThresholdsConfig,
    pub campaigns: CampaignsFile,
}

/// Load and validate both YAML configuration files named by `config`.
///
/// # Errors
///
/// Returns `ConfigError` if either file is missing, unparsable, or invalid.
pub fn load_engine_config(config: &AppConfig) -> Result<EngineConfig, ConfigError> {
    let thresholds = load_thresholds(&config.thresholds_path)?;
    let campaigns = load_campaigns(&config.campaigns_path)?;
    Ok(EngineConfig {
        thresholds,
        campaigns,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
