//! Audit trail events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of event recorded in the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DocumentUpload,
    AiProcessing,
    #[default]
    UserInteraction,
    FileUpload,
    TokenRenewal,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        Self::DocumentUpload,
        Self::AiProcessing,
        Self::UserInteraction,
        Self::FileUpload,
        Self::TokenRenewal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentUpload => "document_upload",
            Self::AiProcessing => "ai_processing",
            Self::UserInteraction => "user_interaction",
            Self::FileUpload => "file_upload",
            Self::TokenRenewal => "token_renewal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i32,
    pub event_type: EventType,
    pub description: String,
    pub user_id: Option<i32>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Metadata rendered as compact JSON, or empty when there is none.
    pub fn metadata_text(&self) -> String {
        match &self.metadata {
            serde_json::Value::Null => String::new(),
            serde_json::Value::Object(map) if map.is_empty() => String::new(),
            other => other.to_string(),
        }
    }
}
