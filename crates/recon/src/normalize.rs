//! Pure normalization helpers shared by the engine and the CLI preview paths.

use crate::model::CellValue;

/// Textual forms accepted as "delete this key".
pub const TRUTHY: [&str; 5] = ["1", "true", "yes", "y", "t"];

/// Separator used when a composite key is rendered for the audit log.
pub const KEY_SEPARATOR: &str = "|";

/// Separator used when several master values are rendered as one audit field.
pub const VALUE_SEPARATOR: &str = ";";

/// Trimmed text form of a cell. Missing cells become `""`. No case folding.
pub fn normalize_str(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Normalized cell: trimmed text, or `Empty` when nothing is left.
pub fn normalize_cell(value: &CellValue) -> CellValue {
    normalize_str(value).into()
}

pub fn to_bool_delete(value: &CellValue) -> bool {
    let s = normalize_str(value).to_lowercase();
    TRUTHY.contains(&s.as_str())
}

/// Required columns absent from `input_columns`, in `required` order.
pub fn validate_headers<S: AsRef<str>>(input_columns: &[String], required: &[S]) -> Vec<String> {
    required
        .iter()
        .map(|r| r.as_ref())
        .filter(|r| !input_columns.iter().any(|c| c == r))
        .map(String::from)
        .collect()
}

/// Audit rendering of a composite key.
pub fn format_key<S: AsRef<str>>(parts: &[S]) -> String {
    parts.iter().map(|p| p.as_ref()).collect::<Vec<_>>().join(KEY_SEPARATOR)
}

pub fn key_is_complete<S: AsRef<str>>(parts: &[S]) -> bool {
    parts.iter().all(|p| !p.as_ref().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_without_case_change() {
        assert_eq!(normalize_str(&CellValue::text("  Abc ")), "Abc");
        assert_eq!(normalize_str(&CellValue::Empty), "");
        assert_eq!(normalize_str(&CellValue::text("   ")), "");
        assert_eq!(normalize_str(&CellValue::Number(42.0)), "42");
        assert_eq!(normalize_cell(&CellValue::text("  ")), CellValue::Empty);
    }

    #[test]
    fn truthy_delete_flags() {
        for v in ["1", "true", "TRUE", " Yes ", "y", "T"] {
            assert!(to_bool_delete(&CellValue::text(v)), "{v} should be truthy");
        }
        for v in ["0", "false", "no", "", "delete", "2"] {
            assert!(!to_bool_delete(&CellValue::text(v)), "{v} should be falsy");
        }
        assert!(to_bool_delete(&CellValue::Number(1.0)));
        assert!(!to_bool_delete(&CellValue::Number(0.0)));
        assert!(to_bool_delete(&CellValue::Boolean(true)));
        assert!(!to_bool_delete(&CellValue::Empty));
    }

    #[test]
    fn validate_headers_preserves_required_order() {
        let input: Vec<String> = vec!["Family".into(), "VariantID".into()];
        let missing = validate_headers(&input, &["VariantID", "Category", "Family", "is delete"]);
        assert_eq!(missing, vec!["Category", "is delete"]);
        assert!(validate_headers(&input, &["Family"]).is_empty());
    }

    #[test]
    fn header_match_is_exact() {
        let input: Vec<String> = vec!["family".into(), " Family".into()];
        assert_eq!(validate_headers(&input, &["Family"]), vec!["Family"]);
    }

    #[test]
    fn key_formatting() {
        assert_eq!(format_key(&["V1", "M1", "C1", "F1"]), "V1|M1|C1|F1");
        assert_eq!(format_key(&["V1", "", "C1", "F1"]), "V1||C1|F1");
        assert!(key_is_complete(&["a", "b"]));
        assert!(!key_is_complete(&["a", ""]));
    }
}
