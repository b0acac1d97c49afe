//! Document understanding through a cloud cognitive service.
//!
//! Invoices are recognized with a prebuilt invoice model; anything else is
//! read as plain text and scored for sentiment.

mod azure;
mod response;

pub use azure::AzureAnalyzer;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::DocumentType;

/// Sentiment reported when text is too short or the service is unavailable.
pub const NEUTRAL_SENTIMENT: &str = "neutral";

/// Characters of extracted text kept as the description.
pub const DESCRIPTION_CHARS: usize = 500;

/// Characters of extracted text kept as the summary.
pub const SUMMARY_CHARS: usize = 200;

/// Errors from the cognitive service.
#[derive(Debug, Error)]
pub enum CognitiveError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("analysis did not finish after {0} polls")]
    Timeout(u32),
}

/// A party on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Party {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// One invoice line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItem {
    pub quantity: Option<f64>,
    pub name: Option<String>,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
}

/// Fields recognized on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoiceData {
    pub customer: Party,
    pub vendor: Party,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub items: Vec<LineItem>,
    pub total: Option<f64>,
}

/// Text read from a non-invoice document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformationData {
    pub description: String,
    pub summary: String,
    pub sentiment: String,
}

impl InformationData {
    pub fn from_text(text: &str, sentiment: String) -> Self {
        Self {
            description: truncate_chars(text, DESCRIPTION_CHARS),
            summary: truncate_chars(text, SUMMARY_CHARS),
            sentiment,
        }
    }
}

/// Outcome of analyzing one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "document_type", rename_all = "snake_case")]
pub enum AnalysisResult {
    Invoice(InvoiceData),
    Information(InformationData),
}

impl AnalysisResult {
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Invoice(_) => DocumentType::Invoice,
            Self::Information(_) => DocumentType::Information,
        }
    }

    /// Sentiment label; only informational documents carry one.
    pub fn sentiment(&self) -> Option<&str> {
        match self {
            Self::Invoice(_) => None,
            Self::Information(info) => Some(&info.sentiment),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Something that can analyze an uploaded document.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        content: &[u8],
        content_type: &str,
    ) -> Result<AnalysisResult, CognitiveError>;
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
