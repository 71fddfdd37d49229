//! Transaction handles and the stack that tracks them.
//!
//! The stack only ever changes at its top: `begin`/`begin_nested` push, and
//! `commit`/`rollback` pop the most recent handle before talking to the
//! backend, so a handle is never reused even when the backend call fails.

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::SqlMyError;

/// One open transaction scope.
#[derive(Debug, PartialEq, Eq)]
pub enum TransactionHandle {
    /// Outermost `BEGIN ... COMMIT` scope.
    Root,
    /// Nested scope backed by a named savepoint.
    Savepoint { name: String },
}

impl TransactionHandle {
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, TransactionHandle::Root)
    }

    /// Make this scope's writes part of the enclosing scope (or durable, for a root).
    ///
    /// If the backend refuses the commit (a deferred constraint, say), the
    /// scope is rolled back before the error is returned.
    ///
    /// # Errors
    /// Returns the classified backend error if the statement fails.
    pub fn commit(self, conn: &Connection) -> Result<(), SqlMyError> {
        match self {
            TransactionHandle::Root => conn.execute_batch("COMMIT").map_err(|err| {
                if !conn.is_autocommit() {
                    undo_failed_commit(conn, "ROLLBACK");
                }
                SqlMyError::from(err)
            }),
            TransactionHandle::Savepoint { name } => conn
                .execute_batch(&format!("RELEASE SAVEPOINT {name}"))
                .map_err(|err| {
                    undo_failed_commit(
                        conn,
                        &format!("ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}"),
                    );
                    SqlMyError::from(err)
                }),
        }
    }

    /// Undo this scope's writes; a savepoint rollback leaves the enclosing scope open.
    ///
    /// # Errors
    /// Returns the classified backend error if the statement fails.
    pub fn rollback(self, conn: &Connection) -> Result<(), SqlMyError> {
        match self {
            TransactionHandle::Root => {
                // SQLite ends the transaction by itself after some failures.
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")?;
                }
            }
            TransactionHandle::Savepoint { name } => {
                conn.execute_batch(&format!(
                    "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}"
                ))?;
            }
        }
        Ok(())
    }
}

fn undo_failed_commit(conn: &Connection, sql: &str) {
    match conn.execute_batch(sql) {
        Ok(()) => debug!("rolled back scope after failed commit"),
        Err(err) => warn!(error = %err, "rollback after failed commit failed"),
    }
}

/// Ordered open scopes, most recent last.
#[derive(Debug, Default)]
pub struct TransactionStack {
    handles: Vec<TransactionHandle>,
    next_savepoint: u64,
}

impl TransactionStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[must_use]
    pub fn top(&self) -> Option<&TransactionHandle> {
        self.handles.last()
    }

    /// Run `BEGIN` and push a root handle.
    ///
    /// # Errors
    /// Returns the classified backend error if `BEGIN` fails; the stack is unchanged.
    pub fn begin(&mut self, conn: &Connection) -> Result<(), SqlMyError> {
        conn.execute_batch("BEGIN")?;
        self.handles.push(TransactionHandle::Root);
        debug!(depth = self.depth(), "began root transaction");
        Ok(())
    }

    /// Open a savepoint and push its handle.
    ///
    /// # Errors
    /// Returns the classified backend error if `SAVEPOINT` fails; the stack is unchanged.
    pub fn begin_nested(&mut self, conn: &Connection) -> Result<(), SqlMyError> {
        self.next_savepoint += 1;
        let name = format!("sqlmy_sp_{}", self.next_savepoint);
        conn.execute_batch(&format!("SAVEPOINT {name}"))?;
        debug!(depth = self.depth() + 1, savepoint = %name, "began nested transaction");
        self.handles.push(TransactionHandle::Savepoint { name });
        Ok(())
    }

    /// Remove the top handle without touching the backend.
    pub fn pop(&mut self) -> Option<TransactionHandle> {
        self.handles.pop()
    }

    /// Pop and commit the top handle.
    ///
    /// # Errors
    /// `StateError` on an empty stack, otherwise the backend's commit error.
    pub fn commit(&mut self, conn: &Connection) -> Result<(), SqlMyError> {
        let handle = self.pop().ok_or_else(SqlMyError::not_started)?;
        debug!(depth = self.depth(), root = handle.is_root(), "committing transaction");
        handle.commit(conn)
    }

    /// Pop and roll back the top handle.
    ///
    /// # Errors
    /// `StateError` on an empty stack, otherwise the backend's rollback error.
    pub fn rollback(&mut self, conn: &Connection) -> Result<(), SqlMyError> {
        let handle = self.pop().ok_or_else(SqlMyError::not_started)?;
        debug!(depth = self.depth(), root = handle.is_root(), "rolling back transaction");
        handle.rollback(conn)
    }

    /// Forget every open scope (the connection is going away).
    pub fn clear(&mut self) {
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_table() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn empty_stack_commit_and_rollback_fail_without_side_effects() {
        let conn = conn_with_table();
        let mut stack = TransactionStack::new();
        assert!(matches!(stack.commit(&conn), Err(SqlMyError::StateError(_))));
        assert!(matches!(stack.rollback(&conn), Err(SqlMyError::StateError(_))));
        assert!(conn.is_autocommit());
    }

    #[test]
    fn savepoint_rollback_keeps_outer_scope() {
        let conn = conn_with_table();
        let mut stack = TransactionStack::new();
        stack.begin(&conn).unwrap();
        conn.execute_batch("INSERT INTO t VALUES (1)").unwrap();
        stack.begin_nested(&conn).unwrap();
        conn.execute_batch("INSERT INTO t VALUES (2)").unwrap();
        assert_eq!(stack.depth(), 2);

        stack.rollback(&conn).unwrap();
        assert_eq!(stack.depth(), 1);
        assert!(!conn.is_autocommit());
        assert_eq!(count(&conn), 1);

        stack.commit(&conn).unwrap();
        assert!(stack.is_empty());
        assert!(conn.is_autocommit());
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn savepoint_names_are_never_reused() {
        let conn = conn_with_table();
        let mut stack = TransactionStack::new();
        stack.begin(&conn).unwrap();
        stack.begin_nested(&conn).unwrap();
        let first = format!("{:?}", stack.top());
        stack.commit(&conn).unwrap();
        stack.begin_nested(&conn).unwrap();
        let second = format!("{:?}", stack.top());
        assert_ne!(first, second);
        stack.rollback(&conn).unwrap();
        stack.rollback(&conn).unwrap();
    }

    fn conn_with_deferred_fk() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE p (id INTEGER PRIMARY KEY);
             CREATE TABLE c (pid INTEGER REFERENCES p (id) DEFERRABLE INITIALLY DEFERRED);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn refused_root_commit_leaves_no_transaction_open() {
        let conn = conn_with_deferred_fk();
        let mut stack = TransactionStack::new();
        stack.begin(&conn).unwrap();
        conn.execute_batch("INSERT INTO c (pid) VALUES (42)").unwrap();

        let err = stack.commit(&conn).unwrap_err();
        assert!(matches!(err, SqlMyError::IntegrityError(_)));
        assert!(stack.is_empty());
        assert!(conn.is_autocommit());
        let children: i64 = conn
            .query_row("SELECT COUNT(*) FROM c", [], |r| r.get(0))
            .unwrap();
        assert_eq!(children, 0);
    }

    #[test]
    fn refused_outermost_savepoint_release_is_undone() {
        let conn = conn_with_deferred_fk();
        let mut stack = TransactionStack::new();
        stack.begin_nested(&conn).unwrap();
        conn.execute_batch("INSERT INTO c (pid) VALUES (42)").unwrap();

        assert!(stack.commit(&conn).is_err());
        assert!(stack.is_empty());
        assert!(conn.is_autocommit());
    }

    #[test]
    fn root_rollback_tolerates_backend_ended_transaction() {
        let conn = conn_with_table();
        let mut stack = TransactionStack::new();
        stack.begin(&conn).unwrap();
        conn.execute_batch("ROLLBACK").unwrap();
        assert!(stack.rollback(&conn).is_ok());
        assert!(stack.is_empty());
    }
}
