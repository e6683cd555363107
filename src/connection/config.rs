use std::time::Duration;

use serde::Deserialize;

use crate::core::{DbError, Result};

const URL_SCHEME: &str = "sqlite://";
pub const MEMORY_PATH: &str = ":memory:";

/// Connection settings for the bundled SQLite driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database file, or `:memory:`
    pub path: String,

    /// Open without write access
    pub read_only: bool,

    /// How long to wait on a locked database, in milliseconds
    pub busy_timeout_ms: u64,

    /// Emit a debug event for every statement
    pub log_statements: bool,
}

impl ConnectionConfig {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            read_only: false,
            busy_timeout_ms: 5_000,
            log_statements: true,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    pub fn busy_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn is_in_memory(&self) -> bool {
        self.path == MEMORY_PATH
    }

    /// Parses `sqlite://<path>` with an optional `?mode=ro` suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// # use dbmapper::ConnectionConfig;
    /// let config = ConnectionConfig::from_url("sqlite:///var/data/app.db?mode=ro").unwrap();
    /// assert_eq!(config.path, "/var/data/app.db");
    /// assert!(config.read_only);
    /// ```
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix(URL_SCHEME)
            .ok_or_else(|| DbError::Config(format!("URL must start with '{}'", URL_SCHEME)))?;

        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };
        if path.is_empty() {
            return Err(DbError::Config("URL has no database path".into()));
        }

        let mut config = Self::new(path);
        for pair in query.into_iter().flat_map(|q| q.split('&')) {
            match pair.split_once('=') {
                Some(("mode", "ro")) => config.read_only = true,
                Some(("mode", "rw")) => config.read_only = false,
                Some(("busy_timeout", ms)) => {
                    config.busy_timeout_ms = ms
                        .parse()
                        .map_err(|_| DbError::Config(format!("invalid busy_timeout '{}'", ms)))?;
                }
                _ => return Err(DbError::Config(format!("unsupported URL option '{}'", pair))),
            }
        }
        Ok(config)
    }

    pub fn to_url(&self) -> String {
        let mode = if self.read_only { "ro" } else { "rw" };
        format!(
            "{}{}?mode={}&busy_timeout={}",
            URL_SCHEME, self.path, mode, self.busy_timeout_ms
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(DbError::Config("path cannot be empty".into()));
        }

        if self.read_only && self.is_in_memory() {
            return Err(DbError::Config("an in-memory database cannot be read-only".into()));
        }

        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}
