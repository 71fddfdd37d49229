//! Table-handle accessors over a shared manager.

use std::collections::HashMap;
use std::sync::Arc;

use crate::database::Database;
use crate::error::SqlMyError;
use crate::schema::TableDef;

/// Pairs a registered table with the manager that owns it.
#[derive(Debug, Clone)]
pub struct Repository {
    database: Arc<Database>,
    table: TableDef,
}

impl Repository {
    #[must_use]
    pub fn new(database: Arc<Database>, table: TableDef) -> Self {
        Self { database, table }
    }

    #[must_use]
    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    #[must_use]
    pub fn table(&self) -> &TableDef {
        &self.table
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table.name
    }
}

/// One repository per table registered with the manager.
#[derive(Debug)]
pub struct RepositoryFactory {
    repositories: HashMap<String, Repository>,
}

impl RepositoryFactory {
    #[must_use]
    pub fn new(database: &Arc<Database>) -> Self {
        let repositories = database
            .schema()
            .iter()
            .map(|table| {
                (
                    table.name.clone(),
                    Repository::new(Arc::clone(database), table.clone()),
                )
            })
            .collect();
        Self { repositories }
    }

    /// # Errors
    /// `ValueError` if no repository exists for `table_name`.
    pub fn get_repository(&self, table_name: &str) -> Result<&Repository, SqlMyError> {
        self.repositories.get(table_name).ok_or_else(|| {
            SqlMyError::ValueError(format!("No repository found for table: {table_name}"))
        })
    }
}
