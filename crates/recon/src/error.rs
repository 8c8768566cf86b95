use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// Schema validation error (no key columns, blank names).
    ConfigValidation(String),
    /// The same column name is used twice across keys, value and delete flag.
    DuplicateColumn(String),
    /// A table the operation needs lacks a column.
    MissingColumn { table: String, column: String },
    /// Audit serialization error.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigValidation(msg) => write!(f, "schema validation error: {msg}"),
            Self::DuplicateColumn(name) => {
                write!(f, "schema validation error: column '{name}' is used more than once")
            }
            Self::MissingColumn { table, column } => {
                write!(f, "{table}: missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
