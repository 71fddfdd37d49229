use rusqlite::Connection;
use tracing::{debug, warn};

use super::Database;
use crate::error::SqlMyError;
use crate::results::ResultSet;
use crate::sqlite::{bind_named, build_result_set, run_bound};
use crate::statement::StatementKind;
use crate::transaction::TransactionStack;
use crate::types::QueryParams;

/// Result of [`Database::execute_query`], shaped by the statement kind.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// Every row of a `SELECT`, possibly none.
    Rows(ResultSet),
    /// Row id assigned by an `INSERT`.
    LastInsertId(i64),
    /// Rows changed by any other statement.
    RowsAffected(usize),
}

impl QueryOutcome {
    #[must_use]
    pub fn kind(&self) -> StatementKind {
        match self {
            QueryOutcome::Rows(_) => StatementKind::Select,
            QueryOutcome::LastInsertId(_) => StatementKind::Insert,
            QueryOutcome::RowsAffected(_) => StatementKind::Other,
        }
    }

    #[must_use]
    pub fn rows(&self) -> Option<&ResultSet> {
        match self {
            QueryOutcome::Rows(rs) => Some(rs),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_rows(self) -> Option<ResultSet> {
        match self {
            QueryOutcome::Rows(rs) => Some(rs),
            _ => None,
        }
    }

    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        match self {
            QueryOutcome::LastInsertId(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn rows_affected(&self) -> Option<usize> {
        match self {
            QueryOutcome::RowsAffected(n) => Some(*n),
            _ => None,
        }
    }
}

impl Database {
    /// Execute one statement with named parameters.
    ///
    /// `SELECT` returns its rows, `INSERT` the new row id, anything else the
    /// affected row count. Durable writes need a scope opened beforehand with
    /// [`Database::start_transaction`]; without one SQLite autocommits.
    ///
    /// On failure the innermost open scope is popped and rolled back before
    /// the error is returned.
    ///
    /// # Errors
    /// `StateError` without an open connection; otherwise the classified
    /// backend error, or `ValueError` for a placeholder with no value.
    pub fn execute_query(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<QueryOutcome, SqlMyError> {
        let kind = StatementKind::classify(sql);
        self.run_in_scope(|conn| run_statement(conn, sql, params, kind))
    }

    /// `start_transaction`, `execute_query`, `commit_transaction` under the
    /// instance-wide write lock.
    ///
    /// # Errors
    /// As [`Database::execute_query`]; a failed statement has already been
    /// rolled back when the error is returned.
    pub fn execute_query_with_transaction(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<QueryOutcome, SqlMyError> {
        let _guard = self.write_guard();
        self.bracketed(sql, params)
    }

    /// The start / execute / commit sequence; callers hold the write lock.
    pub(crate) fn bracketed(
        &self,
        sql: &str,
        params: &QueryParams,
    ) -> Result<QueryOutcome, SqlMyError> {
        self.start_transaction()?;
        let outcome = self.execute_query(sql, params)?;
        self.commit_transaction()?;
        Ok(outcome)
    }

    /// Run `op` against the open connection; if it fails, roll back the
    /// innermost scope before handing the error back.
    pub(super) fn run_in_scope<R>(
        &self,
        op: impl FnOnce(&Connection) -> Result<R, SqlMyError>,
    ) -> Result<R, SqlMyError> {
        let mut session = self.session();
        let (conn, stack) = session.parts()?;
        op(conn).inspect_err(|err| rollback_after_failure(conn, stack, err))
    }
}

fn run_statement(
    conn: &Connection,
    sql: &str,
    params: &QueryParams,
    kind: StatementKind,
) -> Result<QueryOutcome, SqlMyError> {
    let mut stmt = conn.prepare(sql)?;
    bind_named(&mut stmt, params)?;
    match kind {
        StatementKind::Select => Ok(QueryOutcome::Rows(build_result_set(&mut stmt)?)),
        StatementKind::Insert => {
            run_bound(conn, &mut stmt)?;
            Ok(QueryOutcome::LastInsertId(conn.last_insert_rowid()))
        }
        StatementKind::Other => Ok(QueryOutcome::RowsAffected(run_bound(
            conn, &mut stmt,
        )?)),
    }
}

/// Best effort: the original failure is what the caller sees.
fn rollback_after_failure(conn: &Connection, stack: &mut TransactionStack, err: &SqlMyError) {
    let Some(handle) = stack.pop() else {
        debug!(error = %err, "statement failed outside a transaction");
        return;
    };
    warn!(
        error = %err,
        category = ?err.category(),
        root = handle.is_root(),
        "statement failed; rolling back current transaction scope"
    );
    if let Err(rollback_err) = handle.rollback(conn) {
        warn!(error = %rollback_err, "automatic rollback failed");
    }
}
