//! Table definitions shipped with the crate.

use crate::error::SqlMyError;
use crate::schema::{ColumnDef, SchemaRegistry, SqlType, TableDef};

pub const STOCK_DATA: &str = "stock_data";
pub const LOGS: &str = "logs";

/// Daily price rows per company and data source.
///
/// # Errors
/// Never in practice; definitions are validated like any other table.
pub fn stock_data() -> Result<TableDef, SqlMyError> {
    let price = |name: &str| ColumnDef::new(name, SqlType::Float).not_null();
    TableDef::new(
        STOCK_DATA,
        vec![
            ColumnDef::new("id", SqlType::Integer).primary_key().indexed(),
            ColumnDef::new("company_id", SqlType::Integer).not_null(),
            ColumnDef::new("source", SqlType::Varchar(Some(255))).not_null(),
            ColumnDef::new("date", SqlType::Date).not_null(),
            price("open_price"),
            price("close_price"),
            price("high_price"),
            price("low_price"),
            price("volume"),
            price("adjusted_close_price"),
            price("dividend"),
            price("split_coefficient"),
            ColumnDef::new("created_at", SqlType::DateTime).not_null(),
        ],
    )
}

/// One row per log event written by [`crate::log_sink::DatabaseLogLayer`].
///
/// # Errors
/// Never in practice; definitions are validated like any other table.
pub fn logs() -> Result<TableDef, SqlMyError> {
    let text = |name: &str, len: u32| ColumnDef::new(name, SqlType::Varchar(Some(len)));
    TableDef::new(
        LOGS,
        vec![
            ColumnDef::new("id", SqlType::Integer).primary_key(),
            ColumnDef::new("timestamp", SqlType::DateTime).default_expr("CURRENT_TIMESTAMP"),
            text("log_level", 50),
            ColumnDef::new("message", SqlType::Text),
            text("source", 100),
            text("thread_id", 50),
            text("process_id", 50),
            text("user_id", 100),
            text("session_id", 100),
            text("logger_name", 100),
            ColumnDef::new("stack_trace", SqlType::Text),
            text("ip_address", 50),
            text("user_agent", 300),
            text("environment", 50),
            text("tags", 100),
            ColumnDef::new("additional_data", SqlType::Text),
        ],
    )
}

/// Registry with every shipped table.
///
/// # Errors
/// Propagates a table definition error.
pub fn default_schema() -> Result<SchemaRegistry, SqlMyError> {
    Ok(SchemaRegistry::new()
        .with_table(stock_data()?)
        .with_table(logs()?))
}
