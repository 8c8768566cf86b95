use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_KEY_COLUMNS: [&str; 4] = ["VariantID", "ManufacturerName", "Category", "Family"];
pub const DEFAULT_VALUE_COLUMN: &str = "RequestedSeries";
pub const DEFAULT_DELETE_COLUMN: &str = "is delete";

fn default_key_columns() -> Vec<String> {
    DEFAULT_KEY_COLUMNS.iter().map(|s| s.to_string()).collect()
}

fn default_value_column() -> String {
    DEFAULT_VALUE_COLUMN.into()
}

fn default_delete_column() -> String {
    DEFAULT_DELETE_COLUMN.into()
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Column names the engine reads and writes. Everything else is passthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default = "default_key_columns")]
    pub key_columns: Vec<String>,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default = "default_delete_column")]
    pub delete_column: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            key_columns: default_key_columns(),
            value_column: default_value_column(),
            delete_column: default_delete_column(),
        }
    }
}

impl Schema {
    /// Columns an input batch must carry: keys, value, delete flag.
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = self.key_columns.clone();
        cols.push(self.value_column.clone());
        cols.push(self.delete_column.clone());
        cols
    }

    /// Columns the master always carries: keys, then value.
    pub fn master_columns(&self) -> Vec<String> {
        let mut cols = self.key_columns.clone();
        cols.push(self.value_column.clone());
        cols
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.key_columns.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one key column is required".into(),
            ));
        }

        let all = self.required_columns();
        for name in &all {
            if name.trim().is_empty() {
                return Err(ReconError::ConfigValidation("column names must not be blank".into()));
            }
        }

        for (i, name) in all.iter().enumerate() {
            if all[..i].contains(name) {
                return Err(ReconError::DuplicateColumn(name.clone()));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
