//! In-process table definitions and the DDL rendered from them.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqlMyError;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

/// Reject anything that is not a plain SQL identifier, since names are
/// interpolated into DDL and bulk-insert statements.
///
/// # Errors
/// Returns `SqlMyError::ValueError` for an invalid identifier.
pub fn validate_identifier(name: &str) -> Result<(), SqlMyError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(SqlMyError::ValueError(format!(
            "invalid SQL identifier: {name:?}"
        )))
    }
}

/// Column types a table definition can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Float,
    /// Variable-length text with an optional length limit.
    Varchar(Option<u32>),
    Text,
    Date,
    DateTime,
    Boolean,
    Blob,
}

impl SqlType {
    /// Declared type as written into `CREATE TABLE`.
    #[must_use]
    pub fn ddl(&self) -> String {
        match self {
            SqlType::Integer => "INTEGER".into(),
            SqlType::Float => "FLOAT".into(),
            SqlType::Varchar(Some(len)) => format!("VARCHAR({len})"),
            SqlType::Varchar(None) => "VARCHAR".into(),
            SqlType::Text => "TEXT".into(),
            SqlType::Date => "DATE".into(),
            SqlType::DateTime => "DATETIME".into(),
            SqlType::Boolean => "BOOLEAN".into(),
            SqlType::Blob => "BLOB".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
    pub indexed: bool,
    /// Raw SQL default expression, e.g. `CURRENT_TIMESTAMP`.
    pub default: Option<String>,
}

impl ColumnDef {
    /// Nullable, non-key column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            primary_key: false,
            indexed: false,
            default: None,
        }
    }

    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    #[must_use]
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    fn ddl(&self) -> String {
        let mut out = format!("{} {}", self.name, self.sql_type.ddl());
        if !self.nullable && !self.primary_key {
            out.push_str(" NOT NULL");
        }
        if let Some(expr) = &self.default {
            out.push_str(" DEFAULT ");
            out.push_str(expr);
        }
        out
    }
}

/// A registered table: name plus ordered columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// # Errors
    /// Returns `SqlMyError::ValueError` if the table or a column name is not
    /// a plain identifier, or a column name repeats.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self, SqlMyError> {
        let name = name.into();
        validate_identifier(&name)?;
        for (i, col) in columns.iter().enumerate() {
            validate_identifier(&col.name)?;
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(SqlMyError::ValueError(format!(
                    "duplicate column {} in table {name}",
                    col.name
                )));
            }
        }
        Ok(Self { name, columns })
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `CREATE TABLE IF NOT EXISTS` followed by one `CREATE INDEX` per indexed column.
    #[must_use]
    pub fn create_sql(&self) -> String {
        let mut defs: Vec<String> = self.columns.iter().map(ColumnDef::ddl).collect();
        let keys: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect();
        if !keys.is_empty() {
            defs.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.name,
            defs.join(",\n    ")
        );
        for col in self.columns.iter().filter(|c| c.indexed) {
            sql.push_str(&format!(
                "\nCREATE INDEX IF NOT EXISTS ix_{table}_{col} ON {table} ({col});",
                table = self.name,
                col = col.name
            ));
        }
        sql
    }

    #[must_use]
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE {}", self.name)
    }
}

/// Ordered set of table definitions known to a manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    tables: Vec<TableDef>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any earlier definition with the same name.
    #[must_use]
    pub fn with_table(mut self, table: TableDef) -> Self {
        self.register(table);
        self
    }

    pub fn register(&mut self, table: TableDef) {
        if let Some(slot) = self.tables.iter_mut().find(|t| t.name == table.name) {
            *slot = table;
        } else {
            self.tables.push(table);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableDef> {
        self.tables.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
