//! CSV content validation.
//!
//! A single pass over an uploaded CSV that reports, per data row:
//! empty cells, rows repeating an earlier row, and non-numeric values in
//! columns whose names look numeric. Findings are collected rather than
//! failing fast; only a malformed file stops the pass early.

use std::collections::HashSet;

use crate::models::{IssueKind, ValidationIssue};

/// Substrings of a lowercased column name that mark it as numeric.
pub const NUMERIC_COLUMN_HINTS: [&str; 6] =
    ["precio", "cantidad", "total", "amount", "price", "quantity"];

/// The header occupies row 1.
const FIRST_DATA_ROW: usize = 2;

/// Validate CSV bytes. An empty result means the file is clean.
pub fn validate_csv(content: &[u8]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let text = match std::str::from_utf8(content) {
        Ok(text) => text,
        Err(e) => {
            issues.push(parse_error(None, format!("File is not valid UTF-8: {}", e)));
            return issues;
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect(),
        Err(e) => {
            issues.push(parse_error(None, format!("Failed to read CSV header: {}", e)));
            return issues;
        }
    };
    let numeric: Vec<bool> = headers.iter().map(|h| is_numeric_column(h)).collect();

    let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();

    for (index, record) in reader.records().enumerate() {
        let row = index + FIRST_DATA_ROW;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                issues.push(parse_error(Some(row), format!("Failed to parse CSV: {}", e)));
                break;
            }
        };

        let values: Vec<Option<String>> = (0..headers.len())
            .map(|i| record.get(i).map(str::to_string))
            .collect();

        for (column, value) in headers.iter().zip(&values) {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                issues.push(ValidationIssue {
                    kind: IssueKind::EmptyValue,
                    row: Some(row),
                    column: Some(column.clone()),
                    message: format!("Empty value in column '{}'", column),
                });
            }
        }

        if record.len() > headers.len() {
            issues.push(parse_error(
                Some(row),
                format!(
                    "Row has {} fields but the header has {}",
                    record.len(),
                    headers.len()
                ),
            ));
            break;
        }

        if !seen.insert(values.clone()) {
            issues.push(ValidationIssue {
                kind: IssueKind::Duplicate,
                row: Some(row),
                column: None,
                message: format!("Row {} duplicates an earlier row", row),
            });
        }

        for ((column, value), is_numeric) in headers.iter().zip(&values).zip(&numeric) {
            let Some(value) = value.as_deref().map(str::trim) else {
                continue;
            };
            if *is_numeric && !value.is_empty() && !is_number(value) {
                issues.push(ValidationIssue {
                    kind: IssueKind::InvalidType,
                    row: Some(row),
                    column: Some(column.clone()),
                    message: format!("Value '{}' in column '{}' is not a number", value, column),
                });
            }
        }
    }

    issues
}

/// Whether a column name suggests numeric content.
pub fn is_numeric_column(name: &str) -> bool {
    let lower = name.to_lowercase();
    NUMERIC_COLUMN_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Accepts a decimal comma as well as a decimal point.
fn is_number(value: &str) -> bool {
    value.replace(',', ".").parse::<f64>().is_ok()
}

fn parse_error(row: Option<usize>, message: String) -> ValidationIssue {
    ValidationIssue {
        kind: IssueKind::ParseError,
        row,
        column: None,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(issues: &[ValidationIssue]) -> Vec<(IssueKind, Option<usize>, Option<&str>)> {
        issues
            .iter()
            .map(|i| (i.kind, i.row, i.column.as_deref()))
            .collect()
    }

    #[test]
    fn test_clean_file_has_no_issues() {
        let csv = "nombre,precio,cantidad\nPan,1.50,2\nLeche,\"0,99\",1\n";
        assert!(validate_csv(csv.as_bytes()).is_empty());
    }

    #[test]
    fn test_empty_values_including_whitespace() {
        let csv = "name,city\nAna,\nLuis,   \n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![
                (IssueKind::EmptyValue, Some(2), Some("city")),
                (IssueKind::EmptyValue, Some(3), Some("city")),
            ]
        );
    }

    #[test]
    fn test_short_row_reports_missing_columns() {
        let csv = "a,b,c\n1\n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![
                (IssueKind::EmptyValue, Some(2), Some("b")),
                (IssueKind::EmptyValue, Some(2), Some("c")),
            ]
        );
    }

    #[test]
    fn test_duplicates_flag_only_repeats() {
        let csv = "id,name\n1,a\n2,b\n1,a\n1,a\n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![
                (IssueKind::Duplicate, Some(4), None),
                (IssueKind::Duplicate, Some(5), None),
            ]
        );
    }

    #[test]
    fn test_numeric_columns_by_name() {
        let csv = "Product,Unit Price,Total_Amount,notes\nA,abc,10,x\nB,5,1.2.3,12abc\n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![
                (IssueKind::InvalidType, Some(2), Some("Unit Price")),
                (IssueKind::InvalidType, Some(3), Some("Total_Amount")),
            ]
        );
    }

    #[test]
    fn test_issue_order_within_row() {
        let csv = "precio,desc\nx,\nx,\n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![
                (IssueKind::EmptyValue, Some(2), Some("desc")),
                (IssueKind::InvalidType, Some(2), Some("precio")),
                (IssueKind::EmptyValue, Some(3), Some("desc")),
                (IssueKind::Duplicate, Some(3), None),
                (IssueKind::InvalidType, Some(3), Some("precio")),
            ]
        );
    }

    #[test]
    fn test_empty_numeric_cell_is_only_empty() {
        let csv = "quantity\n \n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![(IssueKind::EmptyValue, Some(2), Some("quantity"))]
        );
    }

    #[test]
    fn test_blank_lines_do_not_count_as_rows() {
        let csv = "a,b\n1,2\n\n3,\n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![(IssueKind::EmptyValue, Some(3), Some("b"))]
        );
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let issues = validate_csv(&[0x66, 0x6f, 0xff, 0xfe, b'\n']);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::ParseError);
        assert!(issues[0].row.is_none());
    }

    #[test]
    fn test_extra_fields_stop_processing() {
        let csv = "a,b\n1,2\n3,,5\n1,2\n";
        assert_eq!(
            kinds(&validate_csv(csv.as_bytes())),
            vec![
                (IssueKind::EmptyValue, Some(3), Some("b")),
                (IssueKind::ParseError, Some(3), None),
            ]
        );
    }

    #[test]
    fn test_header_only_and_empty_input() {
        assert!(validate_csv(b"a,b,c\n").is_empty());
        assert!(validate_csv(b"").is_empty());
    }

    #[test]
    fn test_numeric_column_hints() {
        assert!(is_numeric_column("PRECIO_UNITARIO"));
        assert!(is_numeric_column("Cantidad"));
        assert!(is_numeric_column("subtotal"));
        assert!(!is_numeric_column("name"));
    }
}
