//! The connection/transaction manager.
//!
//! `Database` is split across files by concern:
//! - lifecycle: connect / disconnect / DDL for registered tables
//! - tx: transaction stack operations
//! - executor: statement execution with rollback on failure
//! - inspect: live schema introspection
//! - bulk: multi-row loads of `TableData`

mod bulk;
mod executor;
mod inspect;
mod lifecycle;
mod tx;

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::warn;

use crate::config::DatabaseOptions;
use crate::error::SqlMyError;
use crate::schema::SchemaRegistry;
use crate::transaction::TransactionStack;

pub use executor::QueryOutcome;
pub use inspect::{ColumnInfo, TableMetadata};

/// Shared manager for one SQLite database.
///
/// Obtain it through [`Database::instance`] (or
/// [`crate::DatabaseOptionsBuilder::build`]); every caller asking for the same
/// identity gets the same `Arc`.
///
/// Each method locks the connection state for the duration of that call
/// only. Sequences such as `start_transaction` / `execute_query` /
/// `commit_transaction` issued from several threads at once interleave;
/// multi-threaded writers should go through
/// [`Database::execute_query_with_transaction`] or [`Database::df_to_sql`],
/// which hold the instance-wide write lock for their whole duration.
pub struct Database {
    options: DatabaseOptions,
    session: Mutex<Session>,
    write_lock: Mutex<()>,
}

/// Connection handle plus the scopes open on it.
#[derive(Default)]
pub(crate) struct Session {
    conn: Option<Connection>,
    stack: TransactionStack,
}

impl Session {
    /// Borrow the open connection and the stack.
    fn parts(&mut self) -> Result<(&Connection, &mut TransactionStack), SqlMyError> {
        match self.conn.as_ref() {
            Some(conn) => Ok((conn, &mut self.stack)),
            None => Err(SqlMyError::not_initialized()),
        }
    }

    /// Like [`Session::parts`], opening the connection first if needed.
    fn open_parts(
        &mut self,
        options: &DatabaseOptions,
    ) -> Result<(&Connection, &mut TransactionStack), SqlMyError> {
        if self.conn.is_none() {
            self.conn = Some(lifecycle::open_connection(options)?);
        }
        self.parts()
    }
}

impl Database {
    pub(crate) fn new(options: DatabaseOptions) -> Self {
        Self {
            options,
            session: Mutex::new(Session::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Get (or create) the shared manager for `options.db_path`.
    ///
    /// Options passed after the first construction for an identity are ignored.
    #[must_use]
    pub fn instance(options: DatabaseOptions) -> Arc<Self> {
        crate::registry::instance(options)
    }

    #[must_use]
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        self.options.identity()
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRegistry {
        &self.options.schema
    }

    pub(crate) fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| {
            warn!(identity = %self.identity(), "session lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session();
        f.debug_struct("Database")
            .field("identity", &self.identity())
            .field("connected", &session.conn.is_some())
            .field("transaction_depth", &session.stack.depth())
            .finish()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.disconnect();
    }
}
