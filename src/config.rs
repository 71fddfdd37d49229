use std::sync::Arc;
use std::time::Duration;

use crate::database::Database;
use crate::error::SqlMyError;
use crate::schema::SchemaRegistry;

const MEMORY: &str = ":memory:";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for a [`Database`] manager.
///
/// `db_path` is also the identity under which the manager is registered.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub db_path: String,
    pub schema: SchemaRegistry,
    pub busy_timeout: Duration,
    pub wal: bool,
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            schema: SchemaRegistry::new(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            wal: false,
        }
    }

    /// Parse an engine-style URL.
    ///
    /// Accepted forms: `sqlite:///relative.db`, `sqlite:////abs/path.db`,
    /// `sqlite:///:memory:`, `sqlite://` (in memory) and a bare path.
    ///
    /// # Errors
    /// Returns `SqlMyError::ConfigError` for any other URL scheme or a
    /// malformed `sqlite:` URL.
    pub fn from_url(url: &str) -> Result<Self, SqlMyError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SqlMyError::ConfigError("empty database url".into()));
        }
        let Some((scheme, rest)) = url.split_once("://") else {
            return Ok(Self::new(url));
        };
        if !scheme.eq_ignore_ascii_case("sqlite") {
            return Err(SqlMyError::ConfigError(format!(
                "unsupported database backend: {scheme}"
            )));
        }
        if rest.is_empty() {
            return Ok(Self::new(MEMORY));
        }
        match rest.strip_prefix('/') {
            Some("") => Err(SqlMyError::ConfigError(format!("missing database path in {url}"))),
            Some(path) => Ok(Self::new(path)),
            None => Err(SqlMyError::ConfigError(format!(
                "sqlite urls take no host: {url}"
            ))),
        }
    }

    /// Identity key used by the singleton registry.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.db_path
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path == MEMORY
    }
}

/// Fluent builder for [`DatabaseOptions`].
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: DatabaseOptions::new(db_path),
        }
    }

    /// # Errors
    /// See [`DatabaseOptions::from_url`].
    pub fn from_url(url: &str) -> Result<Self, SqlMyError> {
        Ok(Self {
            opts: DatabaseOptions::from_url(url)?,
        })
    }

    #[must_use]
    pub fn schema(mut self, schema: SchemaRegistry) -> Self {
        self.opts.schema = schema;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Get (or create) the shared manager for these options.
    #[must_use]
    pub fn build(self) -> Arc<Database> {
        crate::registry::instance(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_forms() {
        let path = |url: &str| DatabaseOptions::from_url(url).unwrap().db_path;
        assert_eq!(path("sqlite:///:memory:"), ":memory:");
        assert!(DatabaseOptions::from_url("sqlite://").unwrap().is_memory());
        assert_eq!(path("sqlite:///data/app.db"), "data/app.db");
        assert_eq!(path("sqlite:////tmp/app.db"), "/tmp/app.db");
        assert_eq!(path("plain.db"), "plain.db");
    }

    #[test]
    fn other_backends_are_rejected() {
        let err = DatabaseOptions::from_url("postgresql://u:p@host:5432/db").unwrap_err();
        assert!(matches!(err, SqlMyError::ConfigError(_)));
        assert!(DatabaseOptions::from_url("sqlite://host/db").is_err());
        assert!(DatabaseOptions::from_url("  ").is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let opts = DatabaseOptionsBuilder::new("x.db")
            .busy_timeout(Duration::from_millis(250))
            .wal(true)
            .finish();
        assert_eq!(opts.identity(), "x.db");
        assert_eq!(opts.busy_timeout, Duration::from_millis(250));
        assert!(opts.wal);
    }
}
