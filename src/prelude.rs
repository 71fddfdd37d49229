//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use crate::database::{ColumnInfo, Database, QueryOutcome, TableMetadata};
pub use crate::error::{ErrorCategory, SqlMyError};
pub use crate::results::{DbRow, ResultSet};
pub use crate::schema::{ColumnDef, SchemaRegistry, SqlType, TableDef};
pub use crate::statement::StatementKind;
pub use crate::table_data::{IfExists, TableData};
pub use crate::type_map::GenericType;
pub use crate::types::{QueryParams, RowValues};
pub use crate::params;
