use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use super::Database;
use crate::error::SqlMyError;
use crate::type_map::{GenericType, convert_sql_type_to_generic};

/// One column as the live database reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, upper-cased (`VARCHAR(255)`); empty when undeclared.
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

/// A table and its columns, read on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

pub(super) fn table_exists(conn: &Connection, name: &str) -> Result<bool, SqlMyError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn read_columns(conn: &Connection, name: &str) -> Result<Vec<ColumnInfo>, SqlMyError> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let rows = stmt.query_map([name], |row| {
        let not_null: i64 = row.get(2)?;
        let pk: i64 = row.get(4)?;
        let sql_type: String = row.get(1)?;
        Ok(ColumnInfo {
            name: row.get(0)?,
            sql_type: sql_type.trim().to_ascii_uppercase(),
            nullable: not_null == 0 && pk == 0,
            default: row.get(3)?,
            primary_key: pk > 0,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn missing_table(name: &str) -> SqlMyError {
    SqlMyError::ValueError(format!("table {name} does not exist"))
}

impl Database {
    /// Whether `name` is a table in the live database (not just registered).
    ///
    /// # Errors
    /// Returns `SqlMyError` if the connection cannot be opened or the catalog query fails.
    pub fn exists_table(&self, name: &str) -> Result<bool, SqlMyError> {
        let mut session = self.session();
        let (conn, _) = session.open_parts(&self.options)?;
        table_exists(conn, name)
    }

    /// Live user table names, sorted.
    ///
    /// # Errors
    /// Returns `SqlMyError` if the connection cannot be opened or the catalog query fails.
    pub fn get_table_names(&self) -> Result<Vec<String>, SqlMyError> {
        let mut session = self.session();
        let (conn, _) = session.open_parts(&self.options)?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Drop a table through its registered definition.
    ///
    /// # Errors
    /// `StateError` if the table does not exist in the database or is not registered.
    pub fn drop_table(&self, name: &str) -> Result<(), SqlMyError> {
        let mut session = self.session();
        let (conn, _) = session.open_parts(&self.options)?;
        if !table_exists(conn, name)? {
            return Err(SqlMyError::StateError(format!("table {name} does not exist")));
        }
        let table = self.options.schema.get(name).ok_or_else(|| {
            SqlMyError::StateError(format!("table {name} is not registered"))
        })?;
        conn.execute_batch(&table.drop_sql())?;
        Ok(())
    }

    /// Ordered column descriptors of a live table.
    ///
    /// # Errors
    /// `ValueError` if the table does not exist.
    pub fn get_table_schema(&self, name: &str) -> Result<Vec<ColumnInfo>, SqlMyError> {
        let mut session = self.session();
        let (conn, _) = session.open_parts(&self.options)?;
        if !table_exists(conn, name)? {
            return Err(missing_table(name));
        }
        read_columns(conn, name)
    }

    /// # Errors
    /// `ValueError` if the table does not exist.
    pub fn describe_table(&self, name: &str) -> Result<TableMetadata, SqlMyError> {
        Ok(TableMetadata {
            name: name.to_owned(),
            columns: self.get_table_schema(name)?,
        })
    }

    /// Column name to declared SQL type.
    ///
    /// # Errors
    /// `ValueError` if the table does not exist.
    pub fn get_table_column_and_type(
        &self,
        name: &str,
    ) -> Result<HashMap<String, String>, SqlMyError> {
        Ok(self
            .get_table_schema(name)?
            .into_iter()
            .map(|col| (col.name, col.sql_type))
            .collect())
    }

    /// Column name to generic column type.
    ///
    /// # Errors
    /// `ValueError` if the table does not exist or a column type has no mapping.
    pub fn make_pd_type_dict_from_schema(
        &self,
        name: &str,
    ) -> Result<HashMap<String, GenericType>, SqlMyError> {
        self.get_table_column_and_type(name)?
            .into_iter()
            .map(|(col, sql_type)| Ok((col, convert_sql_type_to_generic(&sql_type)?)))
            .collect()
    }

    /// Names in the in-process schema registry, whether or not they exist in the database.
    #[must_use]
    pub fn get_registered_tables(&self) -> Vec<String> {
        self.options.schema.table_names()
    }
}
