use rusqlite::Connection;
use tracing::{debug, warn};

use super::Database;
use crate::config::DatabaseOptions;
use crate::error::SqlMyError;

pub(super) fn open_connection(options: &DatabaseOptions) -> Result<Connection, SqlMyError> {
    let conn = Connection::open(&options.db_path).map_err(SqlMyError::ConnectivityError)?;
    conn.busy_timeout(options.busy_timeout)?;
    if options.wal && !options.is_memory() {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    debug!(identity = %options.identity(), "opened connection");
    Ok(conn)
}

impl Database {
    /// Open the connection if it is not open yet.
    ///
    /// # Errors
    /// Returns `SqlMyError::ConnectivityError` if the database cannot be opened.
    pub fn connect(&self) -> Result<(), SqlMyError> {
        self.session().open_parts(&self.options).map(|_| ())
    }

    /// Close the connection if one is open.
    ///
    /// Open transaction scopes are abandoned: SQLite rolls back whatever was
    /// not committed when the handle closes.
    pub fn disconnect(&self) {
        let mut session = self.session();
        let Some(conn) = session.conn.take() else {
            return;
        };
        let abandoned = session.stack.depth();
        session.stack.clear();
        if abandoned > 0 {
            debug!(identity = %self.identity(), abandoned, "discarding open transaction scopes");
        }
        if let Err((conn, err)) = conn.close() {
            warn!(identity = %self.identity(), error = %err, "close failed; dropping connection");
            drop(conn);
        }
        debug!(identity = %self.identity(), "closed connection");
    }

    /// True while a connection is open.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.session().conn.is_some()
    }

    /// Create every registered table that does not exist yet.
    ///
    /// # Errors
    /// Returns `SqlMyError` if the connection cannot be opened or DDL fails.
    pub fn create_tables(&self) -> Result<(), SqlMyError> {
        let mut session = self.session();
        let (conn, _) = session.open_parts(&self.options)?;
        for table in self.options.schema.iter() {
            conn.execute_batch(&table.create_sql())?;
        }
        debug!(
            identity = %self.identity(),
            tables = self.options.schema.len(),
            "created registered tables"
        );
        Ok(())
    }

    /// Create one registered table if it does not exist yet.
    ///
    /// # Errors
    /// `StateError` if `name` is not registered; otherwise as [`Database::create_tables`].
    pub fn create_table(&self, name: &str) -> Result<(), SqlMyError> {
        let mut session = self.session();
        let (conn, _) = session.open_parts(&self.options)?;
        let table = self.options.schema.get(name).ok_or_else(|| {
            SqlMyError::StateError(format!("table {name} is not registered"))
        })?;
        conn.execute_batch(&table.create_sql())?;
        Ok(())
    }
}
