//! `seriesmaster-recon`: batch reconciliation of series requests against a
//! master table.
//!
//! Pure engine crate: receives pre-loaded tables, returns the new master and
//! an audit trail. No CLI or file IO.

pub mod audit;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod model;
pub mod normalize;
pub mod summary;

pub use audit::{AuditLog, AUDIT_COLUMNS};
pub use compare::match_series;
pub use config::Schema;
pub use engine::{reconcile, reconcile_at};
pub use error::ReconError;
pub use index::MasterIndex;
pub use model::{AuditAction, AuditEntry, CellValue, InputRow, ReconCounts, ReconOutcome, Table};
pub use summary::{input_template, summarize_input, InputSummary};
