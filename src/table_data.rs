//! In-memory tabular data for bulk loads.

use std::str::FromStr;

use clap::ValueEnum;

use crate::error::SqlMyError;
use crate::results::ResultSet;
use crate::schema::SqlType;
use crate::types::RowValues;

/// What a bulk load does when the target table already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum IfExists {
    /// Refuse to write.
    Fail,
    /// Drop and recreate the table, then write.
    Replace,
    /// Keep existing rows and add the new ones.
    #[default]
    Append,
}

impl FromStr for IfExists {
    type Err = SqlMyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| SqlMyError::ValueError(format!("unknown if_exists policy: {s}")))
    }
}

/// One named column.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<RowValues>,
}

/// Ordered named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    columns: Vec<TableColumn>,
}

impl TableData {
    /// # Errors
    /// Returns `SqlMyError::ValueError` on duplicate column names or columns
    /// of different lengths.
    pub fn new<N: Into<String>>(columns: Vec<(N, Vec<RowValues>)>) -> Result<Self, SqlMyError> {
        let columns: Vec<TableColumn> = columns
            .into_iter()
            .map(|(name, values)| TableColumn {
                name: name.into(),
                values,
            })
            .collect();
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(SqlMyError::ValueError(format!(
                    "duplicate column name: {}",
                    col.name
                )));
            }
            if col.values.len() != columns[0].values.len() {
                return Err(SqlMyError::ValueError(format!(
                    "column {} has {} values, expected {}",
                    col.name,
                    col.values.len(),
                    columns[0].values.len()
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build from row-major data.
    ///
    /// # Errors
    /// Returns `SqlMyError::ValueError` if a row's width differs from the
    /// number of column names, or a name repeats.
    pub fn from_rows<N: Into<String>>(
        column_names: Vec<N>,
        rows: Vec<Vec<RowValues>>,
    ) -> Result<Self, SqlMyError> {
        let names: Vec<String> = column_names.into_iter().map(Into::into).collect();
        let mut columns: Vec<Vec<RowValues>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(SqlMyError::ValueError(format!(
                    "row {r} has {} values, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Self::new(names.into_iter().zip(columns).collect())
    }

    /// Materialize a query result as a table.
    ///
    /// # Errors
    /// Returns `SqlMyError::ValueError` if the result repeats a column name.
    pub fn from_result_set(result_set: &ResultSet) -> Result<Self, SqlMyError> {
        let names = result_set.column_names().as_ref().clone();
        let rows = result_set.iter().map(|row| row.values.clone()).collect();
        Self::from_rows(names, rows)
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[RowValues]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Values of row `index`, in column order.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Vec<&RowValues>> {
        if index >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// SQL type for a column, from its first non-null value.
    #[must_use]
    pub(crate) fn inferred_type(column: &TableColumn) -> SqlType {
        match column.values.iter().find(|v| !v.is_null()) {
            Some(RowValues::Int(_) | RowValues::Bool(_)) => SqlType::Integer,
            Some(RowValues::Float(_)) => SqlType::Float,
            Some(RowValues::Timestamp(_)) => SqlType::DateTime,
            Some(RowValues::Blob(_)) => SqlType::Blob,
            Some(RowValues::JSON(_)) => SqlType::Text,
            Some(RowValues::Text(_) | RowValues::Null) | None => SqlType::Varchar(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unequal_lengths_are_rejected() {
        let err = TableData::new(vec![
            ("a", vec![RowValues::Int(1), RowValues::Int(2)]),
            ("b", vec![RowValues::Int(1)]),
        ])
        .unwrap_err();
        assert!(matches!(err, SqlMyError::ValueError(_)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        assert!(TableData::new(vec![("a", vec![]), ("a", vec![])]).is_err());
    }

    #[test]
    fn row_major_and_column_major_agree() {
        let by_rows = TableData::from_rows(
            vec!["id", "name"],
            vec![
                vec![RowValues::Int(1), RowValues::Text("x".into())],
                vec![RowValues::Int(2), RowValues::Text("y".into())],
            ],
        )
        .unwrap();
        let by_cols = TableData::new(vec![
            ("id", vec![RowValues::Int(1), RowValues::Int(2)]),
            (
                "name",
                vec![RowValues::Text("x".into()), RowValues::Text("y".into())],
            ),
        ])
        .unwrap();
        assert_eq!(by_rows, by_cols);
        assert_eq!(by_rows.num_rows(), 2);
        assert_eq!(by_rows.row(1).unwrap()[1], &RowValues::Text("y".into()));
        assert!(by_rows.row(2).is_none());
    }

    #[test]
    fn if_exists_parses_case_insensitively() {
        assert_eq!("REPLACE".parse::<IfExists>().unwrap(), IfExists::Replace);
        assert_eq!(IfExists::default(), IfExists::Append);
        assert!("truncate".parse::<IfExists>().is_err());
    }

    #[test]
    fn types_are_inferred_from_first_non_null() {
        let data = TableData::new(vec![
            ("a", vec![RowValues::Null, RowValues::Float(1.5)]),
            ("b", vec![RowValues::Null, RowValues::Null]),
        ])
        .unwrap();
        assert_eq!(TableData::inferred_type(&data.columns()[0]), SqlType::Float);
        assert_eq!(
            TableData::inferred_type(&data.columns()[1]),
            SqlType::Varchar(None)
        );
    }
}
