//! Uploaded data files and their validation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of an uploaded file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Kind of problem found while validating a CSV upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    EmptyValue,
    Duplicate,
    InvalidType,
    ParseError,
}

/// A single validation finding.
///
/// `row` counts the header as row 1, so the first data row is 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

/// An uploaded file as recorded in the database.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub id: i32,
    pub filename: String,
    pub s3_key: String,
    pub s3_url: Option<String>,
    pub file_size: i64,
    pub content_type: String,
    pub status: FileStatus,
    pub validations: Vec<ValidationIssue>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to record a file.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub filename: String,
    pub s3_key: String,
    pub s3_url: Option<String>,
    pub file_size: i64,
    pub content_type: String,
    pub status: FileStatus,
    pub validations: Vec<ValidationIssue>,
    pub user_id: i32,
}
