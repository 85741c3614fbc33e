//! Statement and execution configuration.

use crate::dialect::{Dialect, Generic};
use std::sync::Arc;
use std::time::Duration;

/// Configuration shared by the clause assemblers and [`crate::Database`].
///
/// A `Config` is cheap to clone; the dialect is reference counted.
#[derive(Debug, Clone)]
pub struct Config {
    /// Dialect used when a statement does not override it.
    pub dialect: Arc<dyn Dialect>,
    /// Separator placed between an embedded record's name and its fields.
    pub separator: String,
    /// Query timeout duration.
    pub query_timeout: Option<Duration>,
    /// Slow query threshold for alerting.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_sql_log_length: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Arc::new(Generic),
            separator: "_".to_string(),
            query_timeout: None,
            slow_query_threshold: None,
            max_sql_log_length: Some(200),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration for a specific dialect.
    pub fn with_dialect(dialect: impl Dialect + 'static) -> Self {
        Self::default().dialect(dialect)
    }

    /// Set the default dialect.
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    /// Set the default dialect from a shared handle (e.g. from a registry).
    pub fn dialect_arc(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the embedded-record name separator.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set query timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    /// Set slow query threshold.
    pub fn slow_query_threshold(mut self, duration: Duration) -> Self {
        self.slow_query_threshold = Some(duration);
        self
    }

    /// Set maximum logged SQL length.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }

    /// Pick the dialect for one statement.
    ///
    /// A per-statement override wins over this configuration's dialect.
    pub fn resolve_dialect(&self, statement: Option<&Arc<dyn Dialect>>) -> Arc<dyn Dialect> {
        statement.cloned().unwrap_or_else(|| self.dialect.clone())
    }
}
