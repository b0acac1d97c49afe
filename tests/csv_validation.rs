//! CSV validation through the public API, as an uploaded file would see it.

use docanalysis::models::IssueKind;
use docanalysis::validation::validate_csv;

#[test]
fn test_sales_report_with_mixed_problems() {
    let csv = "\
fecha,producto,cantidad,precio_unitario,total
2024-01-02,Cafe,2,\"3,50\",7
2024-01-02,Te,,2.00,2
2024-01-03,Pan,uno,1.10,1.10
2024-01-02,Cafe,2,\"3,50\",7
";
    let issues = validate_csv(csv.as_bytes());
    let summary: Vec<(IssueKind, Option<usize>, Option<&str>)> = issues
        .iter()
        .map(|i| (i.kind, i.row, i.column.as_deref()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (IssueKind::EmptyValue, Some(3), Some("cantidad")),
            (IssueKind::InvalidType, Some(4), Some("cantidad")),
            (IssueKind::Duplicate, Some(5), None),
        ]
    );
}

#[test]
fn test_issues_serialize_with_type_key() {
    let issues = validate_csv(b"name,amount\nx,\n");
    let json = serde_json::to_value(&issues).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "type": "empty_value",
            "row": 2,
            "column": "amount",
            "message": "Empty value in column 'amount'"
        }])
    );
}

#[test]
fn test_binary_upload_is_rejected_as_parse_error() {
    let issues = validate_csv(&[0xff, 0xfe, 0x00, 0x41]);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::ParseError);
    assert!(issues[0].row.is_none());
}
