use serde::Serialize;

use crate::config::Schema;
use crate::model::Table;
use crate::normalize::{to_bool_delete, validate_headers};

/// Pre-flight view of an input batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    pub total_rows: usize,
    /// Rows whose delete flag is truthy.
    pub delete_rows: usize,
    pub update_rows: usize,
    pub missing_columns: Vec<String>,
}

impl InputSummary {
    pub fn is_valid(&self) -> bool {
        self.missing_columns.is_empty()
    }
}

/// Count delete and update requests without touching any master.
///
/// A missing delete column counts every row as an update request.
pub fn summarize_input(input: &Table, schema: &Schema) -> InputSummary {
    let missing_columns = validate_headers(&input.columns, &schema.required_columns());
    let delete_rows = match input.column_index(&schema.delete_column) {
        Some(col) => (0..input.len())
            .filter(|&r| to_bool_delete(input.cell(r, col)))
            .count(),
        None => 0,
    };

    InputSummary {
        total_rows: input.len(),
        delete_rows,
        update_rows: input.len() - delete_rows,
        missing_columns,
    }
}

/// Header-only table listing the columns an input batch must carry.
pub fn input_template(schema: &Schema) -> Table {
    Table::new(schema.required_columns())
}
