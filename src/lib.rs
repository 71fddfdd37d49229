//! Thread-safe manager for one SQLite connection.
//!
//! A [`Database`] owns a single connection and a stack of open transaction
//! scopes (a root transaction plus any number of savepoints). Statements run
//! with named parameters; a failing statement rolls back the innermost scope
//! before the error is returned. Managers are shared per database path
//! through a process-wide registry.
//!
//! ```rust,no_run
//! use sqlmy::prelude::*;
//!
//! # fn main() -> Result<(), SqlMyError> {
//! let table = TableDef::new(
//!     "sample_table",
//!     vec![
//!         ColumnDef::new("id", SqlType::Integer).primary_key(),
//!         ColumnDef::new("name", SqlType::Varchar(None)),
//!     ],
//! )?;
//! let db = DatabaseOptionsBuilder::new("app.db")
//!     .schema(SchemaRegistry::new().with_table(table))
//!     .build();
//! db.create_tables()?;
//! let id = db
//!     .execute_query_with_transaction(
//!         "INSERT INTO sample_table (name) VALUES (:name)",
//!         &params! { "name" => "Test" },
//!     )?
//!     .last_insert_id();
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod log_sink;
pub mod models;
pub mod prelude;
pub mod registry;
pub mod repository;
pub mod results;
pub mod schema;
pub mod sqlite;
pub mod statement;
pub mod table_data;
pub mod transaction;
pub mod type_map;
pub mod types;

pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use database::{ColumnInfo, Database, QueryOutcome, TableMetadata};
pub use error::{ErrorCategory, SqlMyError};
pub use log_sink::{DatabaseLogLayer, LogRecord, setup_logging};
pub use repository::{Repository, RepositoryFactory};
pub use results::{DbRow, ResultSet};
pub use table_data::{IfExists, TableData};
pub use type_map::GenericType;
pub use types::{QueryParams, RowValues};
