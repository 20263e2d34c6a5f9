//! In-Memory Table Abstraction
//!
//! The engine consumes already-parsed tabular data: named columns plus
//! string-valued cells. Reading CSV/Excel/SQL into this shape is the
//! collaborator's job (see the ingestion module for the CSV case).

use crate::error::{AnalyticsError, Result};

/// A raw tabular input: column headers and string-valued rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column name to its index, failing with a validation error
    /// if the column is not present.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| {
                AnalyticsError::Validation(format!(
                    "Table '{}' has no column '{}'",
                    self.name, name
                ))
            })
    }

    /// Check that every required column is present. Missing columns are
    /// fatal at load time and are all named in the error.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .filter(|r| !self.columns.iter().any(|c| c == *r))
            .copied()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyticsError::Validation(format!(
                "Table '{}' is missing required columns: {}",
                self.name,
                missing.join(", ")
            )))
        }
    }

    /// Cell value at (row, column index), empty string when the row is short.
    pub fn cell<'a>(&'a self, row: &'a [String], idx: usize) -> &'a str {
        row.get(idx).map(|s| s.as_str()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::new(
            "sales",
            vec!["date".to_string(), "sales_amount".to_string()],
            vec![vec!["2023-01-01".to_string(), "50.0".to_string()]],
        )
    }

    #[test]
    fn test_require_columns_ok() {
        assert!(table().require_columns(&["date", "sales_amount"]).is_ok());
    }

    #[test]
    fn test_require_columns_names_missing() {
        let err = table()
            .require_columns(&["date", "units_sold", "unit_price"])
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("units_sold"));
        assert!(msg.contains("unit_price"));
        assert!(!msg.contains("date,"));
    }

    #[test]
    fn test_column_lookup() {
        let t = table();
        assert_eq!(t.column("sales_amount").unwrap(), 1);
        assert!(t.column("region").is_err());
    }
}
