use rusqlite::Connection;
use tracing::debug;

use super::Database;
use super::inspect::table_exists;
use crate::error::SqlMyError;
use crate::schema::{ColumnDef, SchemaRegistry, TableDef, validate_identifier};
use crate::sqlite::{bind_positional, run_bound};
use crate::table_data::{IfExists, TableData};
use crate::types::RowValues;

/// Bound-parameter budget per statement (SQLite's historical default limit).
const MAX_BOUND_PARAMS: usize = 999;

impl Database {
    /// Write every row of `data` into `table_name` with multi-row inserts.
    ///
    /// Runs under the instance-wide write lock inside one transaction
    /// bracket. A missing table is created from its registered definition,
    /// or from the column types found in `data` when it is not registered.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    /// `ValueError` for invalid identifiers or column-less data; `StateError`
    /// when the table exists and `if_exists` is [`IfExists::Fail`]; otherwise
    /// the classified backend error. Failures roll the bracket back.
    pub fn df_to_sql(
        &self,
        data: &TableData,
        table_name: &str,
        if_exists: IfExists,
    ) -> Result<usize, SqlMyError> {
        validate_identifier(table_name)?;
        if data.num_columns() == 0 {
            return Err(SqlMyError::ValueError("table data has no columns".into()));
        }
        for name in data.column_names() {
            validate_identifier(name)?;
        }

        let _guard = self.write_guard();
        self.start_transaction()?;
        let written = self.run_in_scope(|conn| {
            load_table(conn, &self.options.schema, data, table_name, if_exists)
        })?;
        self.commit_transaction()?;
        debug!(table = table_name, rows = written, ?if_exists, "bulk load committed");
        Ok(written)
    }
}

fn load_table(
    conn: &Connection,
    schema: &SchemaRegistry,
    data: &TableData,
    table_name: &str,
    if_exists: IfExists,
) -> Result<usize, SqlMyError> {
    let exists = table_exists(conn, table_name)?;
    if exists {
        match if_exists {
            IfExists::Fail => {
                return Err(SqlMyError::StateError(format!(
                    "table {table_name} already exists"
                )));
            }
            IfExists::Replace => conn.execute_batch(&format!("DROP TABLE {table_name}"))?,
            IfExists::Append => {}
        }
    }
    if !exists || if_exists == IfExists::Replace {
        let ddl = match schema.get(table_name) {
            Some(table) => table.create_sql(),
            None => inferred_table(table_name, data)?.create_sql(),
        };
        conn.execute_batch(&ddl)?;
    }
    insert_rows(conn, table_name, data)
}

fn inferred_table(table_name: &str, data: &TableData) -> Result<TableDef, SqlMyError> {
    let columns = data
        .columns()
        .iter()
        .map(|col| ColumnDef::new(col.name.clone(), TableData::inferred_type(col)))
        .collect();
    TableDef::new(table_name, columns)
}

fn insert_rows(conn: &Connection, table_name: &str, data: &TableData) -> Result<usize, SqlMyError> {
    let width = data.num_columns();
    let total = data.num_rows();
    let rows_per_batch = (MAX_BOUND_PARAMS / width).max(1);
    let row_placeholder = format!("({})", vec!["?"; width].join(", "));
    let prefix = format!(
        "INSERT INTO {table_name} ({}) VALUES ",
        data.column_names().join(", ")
    );

    let mut start = 0;
    while start < total {
        let end = (start + rows_per_batch).min(total);
        let sql = format!(
            "{prefix}{}",
            vec![row_placeholder.as_str(); end - start].join(", ")
        );
        let mut values: Vec<&RowValues> = Vec::with_capacity((end - start) * width);
        for row in start..end {
            for column in data.columns() {
                values.push(&column.values[row]);
            }
        }
        let mut stmt = conn.prepare_cached(&sql)?;
        bind_positional(&mut stmt, &values)?;
        run_bound(conn, &mut stmt)?;
        start = end;
    }
    Ok(total)
}
