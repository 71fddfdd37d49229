//! Mapping from declared SQL column types to generic tabular column types.

use std::fmt;

use serde::Serialize;

use crate::error::SqlMyError;

/// Column type of an in-memory table, independent of the SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenericType {
    Integer,
    Float,
    DateTime,
    Text,
}

impl GenericType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GenericType::Integer => "integer",
            GenericType::Float => "float",
            GenericType::DateTime => "datetime",
            GenericType::Text => "text",
        }
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base name of a declared type: `VARCHAR(255)` becomes `VARCHAR`.
#[must_use]
pub fn base_type_name(sql_type: &str) -> String {
    sql_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_uppercase()
}

/// Translate a SQL type name into its generic type.
///
/// # Errors
/// Returns `SqlMyError::ValueError` for a type with no mapping entry.
pub fn convert_sql_type_to_generic(sql_type: &str) -> Result<GenericType, SqlMyError> {
    match base_type_name(sql_type).as_str() {
        "INTEGER" => Ok(GenericType::Integer),
        "FLOAT" => Ok(GenericType::Float),
        "DATETIME" => Ok(GenericType::DateTime),
        "VARCHAR" => Ok(GenericType::Text),
        _ => Err(SqlMyError::ValueError(format!(
            "unsupported sql type: {sql_type}"
        ))),
    }
}
