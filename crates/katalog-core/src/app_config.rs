use std::path::PathBuf;

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
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub shops_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub browser_timeout_secs: u64,
    pub user_agent: String,
    pub batch_size: usize,
    /// Cron expression (with seconds) for the processing job in watch mode.
    pub process_cron: String,
    pub rescrape_cron: String,
    pub rescrape_after_hours: u32,
    pub rescrape_limit: usize,
    pub match_exact_threshold: f64,
    pub match_probable_threshold: f64,
    pub home_currency: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("shops_path", &self.shops_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("browser_timeout_secs", &self.browser_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("batch_size", &self.batch_size)
            .field("process_cron", &self.process_cron)
            .field("rescrape_cron", &self.rescrape_cron)
            .field("rescrape_after_hours", &self.rescrape_after_hours)
            .field("rescrape_limit", &self.rescrape_limit)
            .field("match_exact_threshold", &self.match_exact_threshold)
            .field("match_probable_threshold", &self.match_probable_threshold)
            .field("home_currency", &self.home_currency)
            .finish()
    }
}
