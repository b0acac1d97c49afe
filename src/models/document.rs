//! Analyzed documents.
//!
//! A document is an uploaded PDF or image together with whatever the
//! cognitive service extracted from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of an analyzed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Information,
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Information => "information",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "invoice" => Some(Self::Invoice),
            "information" => Some(Self::Information),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: i32,
    pub filename: String,
    pub document_type: DocumentType,
    /// Object storage key of the original upload.
    pub file_path: String,
    pub extracted_data: serde_json::Value,
    pub sentiment: Option<String>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub document_type: DocumentType,
    pub file_path: String,
    pub extracted_data: serde_json::Value,
    pub sentiment: Option<String>,
    pub user_id: i32,
}
