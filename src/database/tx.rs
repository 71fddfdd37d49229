use tracing::debug;

use super::Database;
use crate::error::SqlMyError;

impl Database {
    /// Begin the root transaction, opening the connection if needed.
    ///
    /// A no-op while any scope is already open.
    ///
    /// # Errors
    /// `StateError` if the connection is inside a transaction this manager
    /// did not start; otherwise the backend's `BEGIN` error.
    pub fn start_transaction(&self) -> Result<(), SqlMyError> {
        let mut session = self.session();
        let (conn, stack) = session.open_parts(&self.options)?;
        if !stack.is_empty() {
            debug!(depth = stack.depth(), "transaction already started; not stacking another root");
            return Ok(());
        }
        if !conn.is_autocommit() {
            return Err(SqlMyError::StateError(
                "a transaction is already active on the connection".into(),
            ));
        }
        stack.begin(conn)
    }

    /// Open a savepoint scope on top of whatever is open.
    ///
    /// # Errors
    /// `StateError` without an open connection; otherwise the backend's error.
    pub fn start_nested_transaction(&self) -> Result<(), SqlMyError> {
        let mut session = self.session();
        let (conn, stack) = session.parts()?;
        stack.begin_nested(conn)
    }

    /// Commit the innermost open scope.
    ///
    /// # Errors
    /// `StateError` when no scope is open; otherwise the backend's error.
    pub fn commit_transaction(&self) -> Result<(), SqlMyError> {
        let mut session = self.session();
        if session.stack.is_empty() {
            return Err(SqlMyError::not_started());
        }
        let (conn, stack) = session.parts()?;
        stack.commit(conn)
    }

    /// Roll back the innermost open scope.
    ///
    /// # Errors
    /// `StateError` when no scope is open; otherwise the backend's error.
    pub fn rollback_transaction(&self) -> Result<(), SqlMyError> {
        let mut session = self.session();
        if session.stack.is_empty() {
            return Err(SqlMyError::not_started());
        }
        let (conn, stack) = session.parts()?;
        stack.rollback(conn)
    }

    /// Number of open scopes (0 means no transaction).
    #[must_use]
    pub fn transaction_depth(&self) -> usize {
        self.session().stack.depth()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction_depth() > 0
    }
}
