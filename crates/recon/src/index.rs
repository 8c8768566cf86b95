use std::collections::HashMap;

use crate::model::Table;
use crate::normalize::normalize_str;

/// Normalized key-column values of one record, in key-column order.
pub type CompositeKey = Vec<String>;

/// Composite key → positions of the master records that carry it.
///
/// Built once per run. Positions inside a bucket keep first-seen order so
/// audit output is stable across runs on unchanged master data.
#[derive(Debug, Default)]
pub struct MasterIndex {
    buckets: HashMap<CompositeKey, Vec<usize>>,
}

impl MasterIndex {
    /// One pass over `master`. Missing key columns read as blank.
    pub fn build<S: AsRef<str>>(master: &Table, key_columns: &[S]) -> Self {
        let cols: Vec<Option<usize>> = key_columns
            .iter()
            .map(|k| master.column_index(k.as_ref()))
            .collect();

        let mut buckets: HashMap<CompositeKey, Vec<usize>> = HashMap::new();
        for row in 0..master.len() {
            let key: CompositeKey = cols
                .iter()
                .map(|c| c.map(|c| normalize_str(master.cell(row, c))).unwrap_or_default())
                .collect();
            buckets.entry(key).or_default().push(row);
        }

        Self { buckets }
    }

    pub fn lookup(&self, key: &[String]) -> Option<&[usize]> {
        self.buckets.get(key).map(|v| v.as_slice())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Keys carried by more than one record.
    pub fn duplicate_keys(&self) -> usize {
        self.buckets.values().filter(|v| v.len() > 1).count()
    }
}
