use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_LISTING_URL: &str =
    "https://webscraper.io/test-sites/e-commerce/allinone/computers/laptops";
const DEFAULT_DETAIL_URL_BASE: &str = "https://webscraper.io/test-sites/e-commerce/allinone/product";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
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
/// Returns `ConfigError` if a value is invalid.
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

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_bool(&or_default(var, default)).ok_or_else(|| {
            invalid(
                var,
                "expected one of true, false, 1, 0, yes, no".to_string(),
            )
        })
    };

    let database_url = lookup("DATABASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty());
    let env = parse_environment(&or_default("CATALOG_ENV", "development"))?;
    let log_level = or_default("CATALOG_LOG_LEVEL", "info");

    let listing_url = or_default("CATALOG_LISTING_URL", DEFAULT_LISTING_URL);
    url::Url::parse(&listing_url).map_err(|e| invalid("CATALOG_LISTING_URL", e.to_string()))?;

    let detail_url_base = or_default("CATALOG_DETAIL_URL_BASE", DEFAULT_DETAIL_URL_BASE);
    url::Url::parse(&detail_url_base)
        .map_err(|e| invalid("CATALOG_DETAIL_URL_BASE", e.to_string()))?;

    let selection_token = or_default("CATALOG_SELECTION_TOKEN", "lenovo");
    let persist_unselected = parse_flag("CATALOG_PERSIST_UNSELECTED", "false")?;

    let enrich_max_concurrent = parse_usize("CATALOG_ENRICH_MAX_CONCURRENT", "4")?;
    if enrich_max_concurrent == 0 {
        return Err(invalid(
            "CATALOG_ENRICH_MAX_CONCURRENT",
            "must be at least 1".to_string(),
        ));
    }

    let browser_headless = parse_flag("CATALOG_BROWSER_HEADLESS", "true")?;
    let browser_executable = lookup("CATALOG_BROWSER_EXECUTABLE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);
    let browser_no_sandbox = parse_flag("CATALOG_BROWSER_NO_SANDBOX", "false")?;
    let browser_nav_timeout_secs = parse_u64("CATALOG_BROWSER_NAV_TIMEOUT_SECS", "30")?;
    let browser_settle_ms = parse_u64("CATALOG_BROWSER_SETTLE_MS", "250")?;

    let db_max_connections = parse_u32("CATALOG_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("CATALOG_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "CATALOG_DB_MIN_CONNECTIONS",
            format!("{db_min_connections} exceeds CATALOG_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("CATALOG_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        listing_url,
        detail_url_base,
        selection_token,
        persist_unselected,
        enrich_max_concurrent,
        browser_headless,
        browser_executable,
        browser_no_sandbox,
        browser_nav_timeout_secs,
        browser_settle_ms,
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
            var: "CATALOG_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
