//! Handle configuration.

#[cfg(feature = "tracing")]
use crate::monitor::SqlLogConfig;
use std::time::Duration;

/// Pool size used when none is configured.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Configuration for a [`Database`](crate::Database) handle.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Upper bound for every driver round trip (prepare, query, exec).
    pub query_timeout: Option<Duration>,
    /// Maximum pool size used by `Database::connect`.
    pub max_pool_size: usize,
    /// SQL logging; `None` disables it.
    #[cfg(feature = "tracing")]
    pub sql_log: Option<SqlLogConfig>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            max_pool_size: DEFAULT_POOL_SIZE,
            #[cfg(feature = "tracing")]
            sql_log: None,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set query timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    /// Remove the query timeout.
    pub fn no_timeout(mut self) -> Self {
        self.query_timeout = None;
        self
    }

    /// Set the pool size used when the handle creates its own pool.
    pub fn max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Log executed SQL with default settings (target: `neorm.sql`).
    ///
    /// Requires crate feature `tracing`.
    #[cfg(feature = "tracing")]
    pub fn with_sql_logging(mut self) -> Self {
        self.sql_log = Some(SqlLogConfig::default());
        self
    }

    /// Log executed SQL with custom settings.
    ///
    /// Requires crate feature `tracing`.
    #[cfg(feature = "tracing")]
    pub fn log_sql(mut self, config: SqlLogConfig) -> Self {
        self.sql_log = Some(config);
        self
    }

    /// Disable SQL logging.
    #[cfg(feature = "tracing")]
    pub fn no_logging(mut self) -> Self {
        self.sql_log = None;
        self
    }
}
