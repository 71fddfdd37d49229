#![allow(dead_code)]

use std::sync::Arc;

use sqlmy::prelude::*;
use tempfile::TempDir;

pub const SAMPLE_TABLE: &str = "sample_table";

pub fn sample_table() -> TableDef {
    TableDef::new(
        SAMPLE_TABLE,
        vec![
            ColumnDef::new("id", SqlType::Integer).primary_key(),
            ColumnDef::new("name", SqlType::Varchar(None)),
        ],
    )
    .expect("sample_table definition")
}

/// A manager over a fresh file in its own temp dir; the dir path makes the
/// registry identity unique per test.
pub struct TestDb {
    pub db: Arc<Database>,
    _dir: TempDir,
}

impl TestDb {
    pub fn new(schema: SchemaRegistry) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test.db");
        let db = DatabaseOptionsBuilder::new(path.to_string_lossy().into_owned())
            .schema(schema)
            .build();
        Ok(Self { db, _dir: dir })
    }

    pub fn with_sample_table() -> Result<Self, Box<dyn std::error::Error>> {
        Self::new(SchemaRegistry::new().with_table(sample_table()))
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        sqlmy::registry::release(self.db.identity());
    }
}

pub fn select(db: &Database, sql: &str) -> Result<ResultSet, SqlMyError> {
    let outcome = db.execute_query(sql, &params! {})?;
    Ok(outcome.into_rows().expect("SELECT returns rows"))
}

pub fn count_rows(db: &Database, table: &str) -> Result<i64, SqlMyError> {
    let rs = select(db, &format!("SELECT COUNT(*) AS cnt FROM {table}"))?;
    Ok(*rs[0].get("cnt").and_then(RowValues::as_int).expect("count"))
}

pub fn insert_name(db: &Database, name: &str) -> Result<i64, SqlMyError> {
    let outcome = db.execute_query(
        "INSERT INTO sample_table (name) VALUES (:name)",
        &params! { "name" => name },
    )?;
    Ok(outcome.last_insert_id().expect("INSERT returns an id"))
}
