use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Only the commands that touch the store need it; see
    /// [`AppConfig::require_database_url`].
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    /// Listing page that enumerates every catalog entry.
    pub listing_url: String,
    /// Detail pages live at `{detail_url_base}/{id}`.
    pub detail_url_base: String,
    pub selection_token: String,
    pub persist_unselected: bool,
    pub enrich_max_concurrent: usize,
    pub browser_headless: bool,
    pub browser_executable: Option<PathBuf>,
    pub browser_no_sandbox: bool,
    pub browser_nav_timeout_secs: u64,
    pub browser_settle_ms: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// The configured connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("listing_url", &self.listing_url)
            .field("detail_url_base", &self.detail_url_base)
            .field("selection_token", &self.selection_token)
            .field("persist_unselected", &self.persist_unselected)
            .field("enrich_max_concurrent", &self.enrich_max_concurrent)
            .field("browser_headless", &self.browser_headless)
            .field("browser_executable", &self.browser_executable)
            .field("browser_no_sandbox", &self.browser_no_sandbox)
            .field("browser_nav_timeout_secs", &self.browser_nav_timeout_secs)
            .field("browser_settle_ms", &self.browser_settle_ms)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
