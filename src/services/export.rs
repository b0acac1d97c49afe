//! Event export to spreadsheet, CSV and JSON.

use rust_xlsxwriter::{Format, Workbook};

use super::ServiceError;
use crate::models::Event;

/// Worksheet name in XLSX exports.
pub const SHEET_NAME: &str = "Events";

/// Column headers shared by the XLSX and CSV exports.
pub const COLUMNS: [&str; 6] = ["ID", "Type", "Description", "User ID", "Timestamp", "Metadata"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Render `events` in this format.
    pub fn render(&self, events: &[Event]) -> Result<Vec<u8>, ServiceError> {
        match self {
            Self::Xlsx => export_xlsx(events),
            Self::Csv => export_csv(events),
            Self::Json => export_json(events),
        }
    }
}

fn row_values(event: &Event) -> [String; 6] {
    [
        event.id.to_string(),
        event.event_type.to_string(),
        event.description.clone(),
        event.user_id.map(|id| id.to_string()).unwrap_or_default(),
        event.created_at.format(TIMESTAMP_FORMAT).to_string(),
        event.metadata_text(),
    ]
}

/// Single-sheet workbook with a bold header row.
pub fn export_xlsx(events: &[Event]) -> Result<Vec<u8>, ServiceError> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| ServiceError::Export(e.to_string());

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *title, &header)
            .map_err(xlsx_err)?;
    }

    for (i, event) in events.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet
            .write_number(row, 0, event.id as f64)
            .map_err(xlsx_err)?;
        worksheet
            .write_string(row, 1, event.event_type.as_str())
            .map_err(xlsx_err)?;
        worksheet
            .write_string(row, 2, &event.description)
            .map_err(xlsx_err)?;
        if let Some(user_id) = event.user_id {
            worksheet
                .write_number(row, 3, user_id as f64)
                .map_err(xlsx_err)?;
        }
        worksheet
            .write_string(row, 4, event.created_at.format(TIMESTAMP_FORMAT).to_string())
            .map_err(xlsx_err)?;
        worksheet
            .write_string(row, 5, event.metadata_text())
            .map_err(xlsx_err)?;
    }

    worksheet.set_column_width(2, 50).map_err(xlsx_err)?;
    worksheet.set_column_width(4, 20).map_err(xlsx_err)?;

    workbook.save_to_buffer().map_err(xlsx_err)
}

pub fn export_csv(events: &[Event]) -> Result<Vec<u8>, ServiceError> {
    let csv_err = |e: csv::Error| ServiceError::Export(e.to_string());

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(csv_err)?;
    for event in events {
        writer.write_record(row_values(event)).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| ServiceError::Export(e.to_string()))
}

pub fn export_json(events: &[Event]) -> Result<Vec<u8>, ServiceError> {
    serde_json::to_vec_pretty(events).map_err(|e| ServiceError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventType;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn events() -> Vec<Event> {
        vec![
            Event {
                id: 1,
                event_type: EventType::FileUpload,
                description: "Uploaded \"q1.csv\", 3 issues".to_string(),
                user_id: Some(4),
                metadata: json!({"file_id": 9}),
                created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            },
            Event {
                id: 2,
                event_type: EventType::UserInteraction,
                description: "Failed login".to_string(),
                user_id: None,
                metadata: json!({}),
                created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 5, 0).unwrap(),
            },
        ]
    }

    #[test]
    fn test_csv_export() {
        let bytes = export_csv(&events()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "ID,Type,Description,User ID,Timestamp,Metadata");
        assert_eq!(
            lines[1],
            r#"1,file_upload,"Uploaded ""q1.csv"", 3 issues",4,2024-01-02 03:04:05,"{""file_id"":9}""#
        );
        assert_eq!(lines[2], "2,user_interaction,Failed login,,2024-01-02 03:05:00,");
    }

    #[test]
    fn test_json_export() {
        let bytes = export_json(&events()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["event_type"], "file_upload");
        assert_eq!(value[1]["user_id"], serde_json::Value::Null);
    }

    #[test]
    fn test_xlsx_export_is_a_zip_container() {
        let bytes = export_xlsx(&events()).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let empty = export_xlsx(&[]).unwrap();
        assert!(empty.starts_with(b"PK"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_str("XLSX"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_str("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_str("Excel"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_str("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str("pdf"), None);
        assert_eq!(ExportFormat::default().extension(), "xlsx");
    }
}
