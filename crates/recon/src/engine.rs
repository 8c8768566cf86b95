use crate::audit::{format_column_list, run_timestamp, AuditLog};
use crate::config::Schema;
use crate::index::MasterIndex;
use crate::model::{AuditAction, CellValue, InputRow, ReconCounts, ReconOutcome, Table};
use crate::normalize::{
    format_key, key_is_complete, normalize_cell, normalize_str, to_bool_delete, validate_headers,
    VALUE_SEPARATOR,
};

const COMMENT_BLANK_KEY: &str = "Row skipped: one or more key fields are blank.";
const COMMENT_NO_MATCH: &str = "No matching row in master; no action taken.";

/// Reconcile `input` against `master`, stamping the audit with the current
/// local time.
pub fn reconcile(input: &Table, master: &Table, schema: &Schema) -> ReconOutcome {
    reconcile_at(input, master, schema, &run_timestamp())
}

/// Reconcile with an explicit run timestamp.
///
/// Rows are classified in input order against an index built once from the
/// normalized master. Updates apply immediately to the working copy; deletes
/// only mark records, and marked records are dropped after the last row.
///
/// An invalid `schema` rejects the whole batch, like missing input columns.
pub fn reconcile_at(input: &Table, master: &Table, schema: &Schema, timestamp: &str) -> ReconOutcome {
    let mut audit = AuditLog::new(timestamp);

    if let Err(e) = schema.validate() {
        log::warn!("input rejected: {e}");
        audit.record(AuditAction::RejectFile, "", "", "", format!("Rejected: {e}"));
        return ReconOutcome {
            master: master.clone(),
            audit: audit.into_entries(),
            counts: ReconCounts::default(),
            rejected: true,
            missing_columns: Vec::new(),
            rows_processed: 0,
        };
    }

    let missing = validate_headers(&input.columns, &schema.required_columns());
    if !missing.is_empty() {
        log::warn!("input rejected: missing required columns {missing:?}");
        audit.record(
            AuditAction::RejectFile,
            "",
            "",
            "",
            format!("Rejected: missing required columns {}", format_column_list(&missing)),
        );
        return ReconOutcome {
            master: master.clone(),
            audit: audit.into_entries(),
            counts: ReconCounts::default(),
            rejected: true,
            missing_columns: missing,
            rows_processed: 0,
        };
    }

    let rows = input_rows(input, schema);
    let mut working = prepare_master(master, schema);
    let index = MasterIndex::build(&working, &schema.key_columns);
    log::debug!(
        "master: {} record(s), {} distinct key(s), {} duplicated",
        working.len(),
        index.len(),
        index.duplicate_keys()
    );

    let value_col = working.ensure_column(&schema.value_column);
    let value_name = &schema.value_column;
    let mut marked = vec![false; working.len()];
    let mut counts = ReconCounts::default();

    for row in &rows {
        let key = format_key(&row.key);

        if !key_is_complete(&row.key) {
            audit.record(AuditAction::SkipRow, key, "", "", COMMENT_BLANK_KEY);
            counts.skipped += 1;
            continue;
        }

        let Some(positions) = index.lookup(&row.key) else {
            audit.record(AuditAction::NoMatch, key, "", row.requested.as_str(), COMMENT_NO_MATCH);
            counts.skipped += 1;
            continue;
        };

        let current: Vec<String> = positions
            .iter()
            .map(|&p| normalize_str(working.cell(p, value_col)))
            .collect();
        let n = positions.len();

        if row.is_delete {
            for &p in positions {
                marked[p] = true;
            }
            counts.deletions += n;
            audit.record(
                AuditAction::Delete,
                key,
                current.join(VALUE_SEPARATOR),
                "",
                format!("Deleted {n} row(s) by key."),
            );
        } else if current.iter().all(|v| *v == row.requested) {
            audit.record(
                AuditAction::NoChange,
                key,
                current[0].as_str(),
                row.requested.as_str(),
                format!("{value_name} identical (case-sensitive); no update."),
            );
            counts.skipped += 1;
        } else {
            for &p in positions {
                working.set_cell(p, value_col, CellValue::from(row.requested.as_str()));
            }
            counts.updates += n;
            audit.record(
                AuditAction::Update,
                key,
                current.join(VALUE_SEPARATOR),
                row.requested.as_str(),
                format!("Updated {value_name} on {n} row(s)."),
            );
        }
    }

    if marked.iter().any(|m| *m) {
        working.rows = working
            .rows
            .into_iter()
            .zip(marked)
            .filter_map(|(r, m)| (!m).then_some(r))
            .collect();
    }

    log::info!(
        "reconciled {} row(s): updates={}, deletions={}, skipped={}",
        rows.len(),
        counts.updates,
        counts.deletions,
        counts.skipped
    );

    ReconOutcome {
        master: working,
        audit: audit.into_entries(),
        counts,
        rejected: false,
        missing_columns: Vec::new(),
        rows_processed: rows.len(),
    }
}

/// Normalized requests from an input table. Missing columns read as blank.
pub fn input_rows(input: &Table, schema: &Schema) -> Vec<InputRow> {
    let key_cols: Vec<Option<usize>> = schema
        .key_columns
        .iter()
        .map(|k| input.column_index(k))
        .collect();
    let value_col = input.column_index(&schema.value_column);
    let delete_col = input.column_index(&schema.delete_column);

    let read = |row: usize, col: Option<usize>| -> String {
        col.map(|c| normalize_str(input.cell(row, c))).unwrap_or_default()
    };

    (0..input.len())
        .map(|row| InputRow {
            key: key_cols.iter().map(|&c| read(row, c)).collect(),
            requested: read(row, value_col),
            is_delete: delete_col.is_some_and(|c| to_bool_delete(input.cell(row, c))),
        })
        .collect()
}

/// Copy of `master` carrying every key column and the value column, with
/// those columns trimmed. Absent columns are appended as empty.
pub fn prepare_master(master: &Table, schema: &Schema) -> Table {
    let mut table = master.clone();
    for name in schema.master_columns() {
        let col = table.ensure_column(&name);
        table.map_column(col, normalize_cell);
    }
    table
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2026-01-15T09:30:00";

    fn schema() -> Schema {
        Schema::default()
    }

    fn master(rows: &[(&str, &str, &str, &str, &str)]) -> Table {
        let mut t = Table::with_columns(&["VariantID", "ManufacturerName", "Category", "Family", "RequestedSeries"]);
        for (v, m, c, f, s) in rows {
            t.push_row(vec![(*v).into(), (*m).into(), (*c).into(), (*f).into(), (*s).into()]);
        }
        t
    }

    fn input(rows: &[(&str, &str, &str, &str, &str, &str)]) -> Table {
        let mut t = Table::with_columns(&[
            "VariantID",
            "ManufacturerName",
            "Category",
            "Family",
            "RequestedSeries",
            "is delete",
        ]);
        for (v, m, c, f, s, d) in rows {
            t.push_row(vec![(*v).into(), (*m).into(), (*c).into(), (*f).into(), (*s).into(), (*d).into()]);
        }
        t
    }

    fn series(t: &Table) -> Vec<String> {
        (0..t.len()).map(|r| t.get(r, "RequestedSeries").to_string()).collect()
    }

    #[test]
    fn update_scenario() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let i = input(&[("V1", "M1", "C1", "F1", "Y", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert!(!out.rejected);
        assert_eq!(series(&out.master), vec!["Y"]);
        assert_eq!(out.counts, ReconCounts { updates: 1, deletions: 0, skipped: 0 });
        assert_eq!(out.audit.len(), 1);
        let e = &out.audit[0];
        assert_eq!(e.action, AuditAction::Update);
        assert_eq!(e.key, "V1|M1|C1|F1");
        assert_eq!(e.old_value, "X");
        assert_eq!(e.new_value, "Y");
        assert_eq!(e.comment, "Updated RequestedSeries on 1 row(s).");
        assert_eq!(e.timestamp, TS);
    }

    #[test]
    fn delete_scenario() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let i = input(&[("V1", "M1", "C1", "F1", "", "yes")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert!(out.master.is_empty());
        assert_eq!(out.counts, ReconCounts { updates: 0, deletions: 1, skipped: 0 });
        assert_eq!(out.audit[0].action, AuditAction::Delete);
        assert_eq!(out.audit[0].old_value, "X");
        assert_eq!(out.audit[0].new_value, "");
        assert_eq!(out.audit[0].comment, "Deleted 1 row(s) by key.");
    }

    #[test]
    fn reject_on_missing_family() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let mut i = Table::with_columns(&["VariantID", "ManufacturerName", "Category", "RequestedSeries", "is delete"]);
        i.push_row(vec!["V1".into(), "M1".into(), "C1".into(), "Y".into(), "0".into()]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert!(out.rejected);
        assert_eq!(out.master, m);
        assert_eq!(out.counts, ReconCounts::default());
        assert_eq!(out.missing_columns, vec!["Family"]);
        assert_eq!(out.audit.len(), 1);
        assert_eq!(out.audit[0].action, AuditAction::RejectFile);
        assert_eq!(out.audit[0].key, "");
        assert_eq!(out.audit[0].comment, "Rejected: missing required columns ['Family']");
        assert_eq!(out.rows_processed, 0);
    }

    #[test]
    fn keyless_schema_rejects_instead_of_matching_everything() {
        let m = master(&[("V1", "M1", "C1", "F1", "X"), ("V2", "M2", "C2", "F2", "Y")]);
        let keyless = Schema { key_columns: Vec::new(), ..Schema::default() };
        let mut i = Table::with_columns(&["RequestedSeries", "is delete"]);
        i.push_row(vec!["".into(), "yes".into()]);
        let out = reconcile_at(&i, &m, &keyless, TS);

        assert!(out.rejected);
        assert_eq!(out.master, m);
        assert_eq!(out.counts, ReconCounts::default());
        assert!(out.missing_columns.is_empty());
        assert_eq!(out.audit.len(), 1);
        assert_eq!(out.audit[0].action, AuditAction::RejectFile);
        assert!(out.audit[0].comment.contains("at least one key column"));
    }

    #[test]
    fn blank_key_is_skipped_never_wildcard() {
        let m = master(&[("V1", "M1", "C1", "F1", "X"), ("V1", "M1", "C1", "", "Z")]);
        let i = input(&[("V1", "M1", "C1", "  ", "Y", "1")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.audit[0].action, AuditAction::SkipRow);
        assert_eq!(out.audit[0].key, "V1|M1|C1|");
        assert_eq!(out.audit[0].comment, "Row skipped: one or more key fields are blank.");
        assert_eq!(out.master.len(), 2);
        assert_eq!(series(&out.master), vec!["X", "Z"]);
        assert_eq!(out.counts.skipped, 1);
    }

    #[test]
    fn no_match_never_inserts() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let i = input(&[("V9", "M1", "C1", "F1", "NEW", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.master.len(), 1);
        assert_eq!(out.audit[0].action, AuditAction::NoMatch);
        assert_eq!(out.audit[0].old_value, "");
        assert_eq!(out.audit[0].new_value, "NEW");
        assert_eq!(out.audit[0].comment, "No matching row in master; no action taken.");
        assert_eq!(out.counts.skipped, 1);
    }

    #[test]
    fn identical_value_is_no_change() {
        let m = master(&[("V1", "M1", "C1", "F1", "ABC")]);
        let i = input(&[("V1", "M1", "C1", "F1", " ABC ", "")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.audit[0].action, AuditAction::NoChange);
        assert_eq!(out.audit[0].old_value, "ABC");
        assert_eq!(out.audit[0].comment, "RequestedSeries identical (case-sensitive); no update.");
        assert_eq!(out.counts, ReconCounts { updates: 0, deletions: 0, skipped: 1 });
    }

    #[test]
    fn case_difference_triggers_update() {
        let m = master(&[("V1", "M1", "C1", "F1", "abc")]);
        let i = input(&[("V1", "M1", "C1", "F1", "ABC", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.audit[0].action, AuditAction::Update);
        assert_eq!(series(&out.master), vec!["ABC"]);
    }

    #[test]
    fn duplicate_keys_update_all() {
        let m = master(&[
            ("V1", "M1", "C1", "F1", "A"),
            ("V2", "M1", "C1", "F1", "Q"),
            ("V1", "M1", "C1", "F1", "B"),
        ]);
        let i = input(&[("V1", "M1", "C1", "F1", "Z", "no")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(series(&out.master), vec!["Z", "Q", "Z"]);
        assert_eq!(out.counts.updates, 2);
        assert_eq!(out.audit[0].old_value, "A;B");
        assert_eq!(out.audit[0].comment, "Updated RequestedSeries on 2 row(s).");
    }

    #[test]
    fn duplicate_keys_with_mixed_values_update_even_if_one_matches() {
        let m = master(&[("V1", "M1", "C1", "F1", "Z"), ("V1", "M1", "C1", "F1", "B")]);
        let i = input(&[("V1", "M1", "C1", "F1", "Z", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.audit[0].action, AuditAction::Update);
        assert_eq!(out.counts.updates, 2);
        assert_eq!(series(&out.master), vec!["Z", "Z"]);
    }

    #[test]
    fn duplicate_keys_delete_all() {
        let m = master(&[
            ("V1", "M1", "C1", "F1", "A"),
            ("V2", "M1", "C1", "F1", "Q"),
            ("V1", "M1", "C1", "F1", "B"),
        ]);
        let i = input(&[("V1", "M1", "C1", "F1", "", "TRUE")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.master.len(), 1);
        assert_eq!(series(&out.master), vec!["Q"]);
        assert_eq!(out.counts.deletions, 2);
        assert_eq!(out.audit[0].old_value, "A;B");
        assert_eq!(out.audit[0].comment, "Deleted 2 row(s) by key.");
    }

    #[test]
    fn delete_wins_over_later_update() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let i = input(&[("V1", "M1", "C1", "F1", "", "1"), ("V1", "M1", "C1", "F1", "Y", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert!(out.master.is_empty());
        // The update still sees the record and is audited
        assert_eq!(out.audit[1].action, AuditAction::Update);
        assert_eq!(out.audit[1].old_value, "X");
        assert_eq!(out.counts, ReconCounts { updates: 1, deletions: 1, skipped: 0 });
    }

    #[test]
    fn delete_wins_over_earlier_update() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let i = input(&[("V1", "M1", "C1", "F1", "Y", "0"), ("V1", "M1", "C1", "F1", "", "y")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert!(out.master.is_empty());
        // Delete reports the value written by the earlier update
        assert_eq!(out.audit[1].action, AuditAction::Delete);
        assert_eq!(out.audit[1].old_value, "Y");
    }

    #[test]
    fn repeated_updates_apply_cumulatively() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let i = input(&[
            ("V1", "M1", "C1", "F1", "Y", "0"),
            ("V1", "M1", "C1", "F1", "Y", "0"),
            ("V1", "M1", "C1", "F1", "Z", "0"),
        ]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        let actions: Vec<AuditAction> = out.audit.iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![AuditAction::Update, AuditAction::NoChange, AuditAction::Update]);
        assert_eq!(out.audit[2].old_value, "Y");
        assert_eq!(series(&out.master), vec!["Z"]);
    }

    #[test]
    fn delete_row_does_not_touch_value() {
        let m = master(&[("V1", "M1", "C1", "F1", "X"), ("V2", "M1", "C1", "F1", "K")]);
        let i = input(&[("V1", "M1", "C1", "F1", "NEVER", "1")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.audit[0].new_value, "");
        assert_eq!(series(&out.master), vec!["K"]);
    }

    #[test]
    fn second_run_is_idempotent() {
        let m = master(&[("V1", "M1", "C1", "F1", "X"), ("V2", "M2", "C2", "F2", "P")]);
        let i = input(&[("V1", "M1", "C1", "F1", "Y", "0"), ("V2", "M2", "C2", "F2", "Q", "")]);
        let first = reconcile_at(&i, &m, &schema(), TS);
        let second = reconcile_at(&i, &first.master, &schema(), TS);

        assert!(second.audit.iter().all(|e| e.action == AuditAction::NoChange));
        assert_eq!(second.master, first.master);
        assert_eq!(second.counts, ReconCounts { updates: 0, deletions: 0, skipped: 2 });
    }

    #[test]
    fn passthrough_columns_survive() {
        let mut m = Table::with_columns(&["Note", "VariantID", "ManufacturerName", "Category", "Family", "RequestedSeries", "UsageCount"]);
        m.push_row(vec![
            CellValue::text("  keep me  "),
            "V1".into(),
            "M1".into(),
            "C1".into(),
            "F1".into(),
            "X".into(),
            CellValue::Number(7.0),
        ]);
        let i = input(&[("V1", "M1", "C1", "F1", "Y", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.master.columns, m.columns);
        // Passthrough cells are not normalized
        assert_eq!(out.master.get(0, "Note"), &CellValue::text("  keep me  "));
        assert_eq!(out.master.get(0, "UsageCount"), &CellValue::Number(7.0));
        assert_eq!(out.master.get(0, "RequestedSeries"), &CellValue::text("Y"));
    }

    #[test]
    fn missing_master_columns_are_synthesized() {
        let mut m = Table::with_columns(&["VariantID", "Family"]);
        m.push_row(vec!["V1".into(), "F1".into()]);
        let i = input(&[("V1", "M1", "C1", "F1", "Y", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        for col in ["ManufacturerName", "Category", "RequestedSeries"] {
            assert!(out.master.has_column(col), "{col} should be synthesized");
        }
        // Synthesized key columns are blank, so the input key cannot match
        assert_eq!(out.audit[0].action, AuditAction::NoMatch);
    }

    #[test]
    fn numeric_keys_match_text_keys() {
        let mut m = master(&[]);
        m.push_row(vec![
            CellValue::Number(1001.0),
            "M1".into(),
            "C1".into(),
            "F1".into(),
            "X".into(),
        ]);
        let i = input(&[("1001", "M1", "C1", "F1", "Y", "0")]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        assert_eq!(out.audit[0].action, AuditAction::Update);
        assert_eq!(out.master.get(0, "VariantID"), &CellValue::text("1001"));
    }

    #[test]
    fn extra_input_columns_are_ignored() {
        let m = master(&[("V1", "M1", "C1", "F1", "X")]);
        let mut i = input(&[]);
        i.ensure_column("Manufacturer Part Number");
        i.push_row(vec![
            "V1".into(),
            "M1".into(),
            "C1".into(),
            "F1".into(),
            "Y".into(),
            "".into(),
            "MPN-1".into(),
        ]);
        let out = reconcile_at(&i, &m, &schema(), TS);
        assert_eq!(out.counts.updates, 1);
        assert!(!out.master.has_column("Manufacturer Part Number"));
    }

    #[test]
    fn audit_has_one_entry_per_row_in_input_order() {
        let m = master(&[("V1", "M1", "C1", "F1", "X"), ("V2", "M1", "C1", "F1", "Y")]);
        let i = input(&[
            ("V2", "M1", "C1", "F1", "", "1"),
            ("", "M1", "C1", "F1", "Y", "0"),
            ("V3", "M1", "C1", "F1", "Y", "0"),
            ("V1", "M1", "C1", "F1", "X", "0"),
            ("V1", "M1", "C1", "F1", "W", "0"),
        ]);
        let out = reconcile_at(&i, &m, &schema(), TS);

        let actions: Vec<AuditAction> = out.audit.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::Delete,
                AuditAction::SkipRow,
                AuditAction::NoMatch,
                AuditAction::NoChange,
                AuditAction::Update,
            ]
        );
        assert_eq!(out.rows_processed, 5);
        assert_eq!(out.counts, ReconCounts { updates: 1, deletions: 1, skipped: 3 });
        assert_eq!(
            out.action_counts(),
            vec![
                (AuditAction::Delete, 1),
                (AuditAction::SkipRow, 1),
                (AuditAction::NoMatch, 1),
                (AuditAction::NoChange, 1),
                (AuditAction::Update, 1),
            ]
        );
    }

    #[test]
    fn input_rows_normalize_fields() {
        let i = input(&[(" V1 ", "M1", "C1", "F1", " S ", " Yes ")]);
        let rows = input_rows(&i, &schema());
        assert_eq!(rows[0].key, vec!["V1", "M1", "C1", "F1"]);
        assert_eq!(rows[0].requested, "S");
        assert!(rows[0].is_delete);
    }
}
