use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SqlMyError;
use crate::types::{QueryParams, RowValues, bare_name};

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Bind named parameters onto a prepared statement.
///
/// Every placeholder in the statement must have a value; supplied values the
/// statement does not reference are ignored.
///
/// # Errors
/// Returns `SqlMyError::ValueError` for a placeholder without a value, or the
/// classified backend error if binding fails.
pub fn bind_named(stmt: &mut Statement<'_>, params: &QueryParams) -> Result<(), SqlMyError> {
    for idx in 1..=stmt.parameter_count() {
        let Some(placeholder) = stmt.parameter_name(idx).map(str::to_owned) else {
            return Err(SqlMyError::ValueError(format!(
                "positional placeholder at index {idx} is not supported; use a named placeholder"
            )));
        };
        let value = params.get(bare_name(&placeholder)).ok_or_else(|| {
            SqlMyError::ValueError(format!("no value supplied for placeholder {placeholder}"))
        })?;
        stmt.raw_bind_parameter(idx, row_value_to_sqlite_value(value))?;
    }
    Ok(())
}

/// Bind positional values (`?1`, `?2`, ...) in order.
///
/// # Errors
/// Returns the classified backend error if binding fails.
pub fn bind_positional(stmt: &mut Statement<'_>, values: &[&RowValues]) -> Result<(), SqlMyError> {
    for (i, value) in values.iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, row_value_to_sqlite_value(value))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn bool_and_timestamp_conversion() {
        assert_eq!(
            row_value_to_sqlite_value(&RowValues::Bool(true)),
            Value::Integer(1)
        );
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .and_then(|d| d.and_hms_opt(7, 8, 9))
            .unwrap();
        assert_eq!(
            row_value_to_sqlite_value(&RowValues::Timestamp(ts)),
            Value::Text("2024-05-06 07:08:09".into())
        );
    }

    #[test]
    fn missing_placeholder_value_is_rejected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT :a, :b").unwrap();
        let params = QueryParams::new().bind("a", 1_i64);
        let err = bind_named(&mut stmt, &params).unwrap_err();
        assert!(matches!(err, SqlMyError::ValueError(_)));
    }

    #[test]
    fn extra_values_are_ignored() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT :a").unwrap();
        let params = QueryParams::new().bind("a", 1_i64).bind("unused", 2_i64);
        assert!(bind_named(&mut stmt, &params).is_ok());
    }
}
