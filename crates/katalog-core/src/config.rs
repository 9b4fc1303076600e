use crate::app_config::{AppConfig, Environment};
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

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("KATALOG_ENV", "development"))?;
    let log_level = or_default("KATALOG_LOG_LEVEL", "info");
    let shops_path = PathBuf::from(or_default("KATALOG_SHOPS_PATH", "./config/shops.yaml"));

    let db_max_connections: u32 = parse_as(
        "KATALOG_DB_MAX_CONNECTIONS",
        &or_default("KATALOG_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "KATALOG_DB_MIN_CONNECTIONS",
        &or_default("KATALOG_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "KATALOG_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("KATALOG_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let fetch_timeout_secs: u64 = parse_as(
        "KATALOG_FETCH_TIMEOUT_SECS",
        &or_default("KATALOG_FETCH_TIMEOUT_SECS", "30"),
    )?;
    let browser_timeout_secs: u64 = parse_as(
        "KATALOG_BROWSER_TIMEOUT_SECS",
        &or_default("KATALOG_BROWSER_TIMEOUT_SECS", "120"),
    )?;
    let user_agent = or_default("KATALOG_USER_AGENT", "katalog/0.1 (price-comparison)");

    let batch_size: usize = parse_as(
        "KATALOG_BATCH_SIZE",
        &or_default("KATALOG_BATCH_SIZE", "100"),
    )?;
    let process_cron = or_default("KATALOG_PROCESS_CRON", "*/30 * * * * *");
    let rescrape_cron = or_default("KATALOG_RESCRAPE_CRON", "0 */10 * * * *");
    let rescrape_after_hours: u32 = parse_as(
        "KATALOG_RESCRAPE_AFTER_HOURS",
        &or_default("KATALOG_RESCRAPE_AFTER_HOURS", "6"),
    )?;
    let rescrape_limit: usize = parse_as(
        "KATALOG_RESCRAPE_LIMIT",
        &or_default("KATALOG_RESCRAPE_LIMIT", "10"),
    )?;

    let match_exact_threshold = parse_threshold(
        "KATALOG_MATCH_EXACT_THRESHOLD",
        &or_default("KATALOG_MATCH_EXACT_THRESHOLD", "0.95"),
    )?;
    let match_probable_threshold = parse_threshold(
        "KATALOG_MATCH_PROBABLE_THRESHOLD",
        &or_default("KATALOG_MATCH_PROBABLE_THRESHOLD", "0.70"),
    )?;
    if match_probable_threshold > match_exact_threshold {
        return Err(ConfigError::InvalidEnvVar {
            var: "KATALOG_MATCH_PROBABLE_THRESHOLD".to_string(),
            reason: format!(
                "{match_probable_threshold} exceeds the exact threshold {match_exact_threshold}"
            ),
        });
    }

    let home_currency = or_default("KATALOG_HOME_CURRENCY", crate::DEFAULT_HOME_CURRENCY)
        .trim()
        .to_uppercase();

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        shops_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch_timeout_secs,
        browser_timeout_secs,
        user_agent,
        batch_size,
        process_cron,
        rescrape_cron,
        rescrape_after_hours,
        rescrape_limit,
        match_exact_threshold,
        match_probable_threshold,
        home_currency,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

fn parse_threshold(var: &str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = parse_as(var, raw)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("{value} is outside [0, 1]"),
        });
    }
    Ok(value)
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KATALOG_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
