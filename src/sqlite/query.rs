use rusqlite::{Connection, Statement};
use rusqlite::types::Value;

use crate::error::SqlMyError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlMyError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<RowValues, SqlMyError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run an already-bound statement and collect every row.
///
/// # Errors
/// Returns the classified backend error if stepping the statement fails.
pub fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlMyError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();
    let mut result_set = ResultSet::new(column_names);

    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Run an already-bound statement for its side effects and return the
/// affected row count. Statements that produce rows are drained first; a
/// writing one (`UPDATE ... RETURNING`) reports the rows it changed, a
/// read-only one (pragmas) reports zero.
///
/// # Errors
/// Returns the classified backend error if execution fails.
pub fn run_bound(conn: &Connection, stmt: &mut Statement<'_>) -> Result<usize, SqlMyError> {
    if stmt.column_count() == 0 {
        return Ok(stmt.raw_execute()?);
    }
    let readonly = stmt.readonly();
    let mut rows = stmt.raw_query();
    while rows.next()?.is_some() {}
    if readonly {
        return Ok(0);
    }
    Ok(usize::try_from(conn.changes()).unwrap_or(usize::MAX))
}
