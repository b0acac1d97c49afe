//! Wire types for the Form Recognizer and Text Analytics REST APIs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{InvoiceData, LineItem, Party};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeOperation {
    pub status: String,
    #[serde(rename = "analyzeResult")]
    pub analyze_result: Option<AnalyzeResult>,
    pub error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServiceError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AnalyzeResult {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Page {
    #[serde(default)]
    pub lines: Vec<Line>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Line {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzedDocument {
    #[serde(default)]
    pub fields: HashMap<String, DocumentField>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct DocumentField {
    #[serde(rename = "valueString")]
    pub value_string: Option<String>,
    #[serde(rename = "valueDate")]
    pub value_date: Option<String>,
    #[serde(rename = "valueNumber")]
    pub value_number: Option<f64>,
    #[serde(rename = "valueInteger")]
    pub value_integer: Option<i64>,
    #[serde(rename = "valueCurrency")]
    pub value_currency: Option<CurrencyValue>,
    #[serde(rename = "valueArray")]
    pub value_array: Option<Vec<DocumentField>>,
    #[serde(rename = "valueObject")]
    pub value_object: Option<HashMap<String, DocumentField>>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CurrencyValue {
    pub amount: Option<f64>,
}

impl DocumentField {
    fn text(&self) -> Option<String> {
        self.value_string
            .clone()
            .or_else(|| self.value_date.clone())
            .or_else(|| self.content.clone())
    }

    fn number(&self) -> Option<f64> {
        self.value_number
            .or(self.value_integer.map(|n| n as f64))
            .or_else(|| self.value_currency.as_ref().and_then(|c| c.amount))
    }
}

fn field_text(fields: &HashMap<String, DocumentField>, name: &str) -> Option<String> {
    fields.get(name).and_then(DocumentField::text)
}

fn field_number(fields: &HashMap<String, DocumentField>, name: &str) -> Option<f64> {
    fields.get(name).and_then(DocumentField::number)
}

impl AnalyzeResult {
    /// All recognized lines, each followed by a newline.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in self.pages.iter().flat_map(|p| &p.lines) {
            out.push_str(&line.content);
            out.push('\n');
        }
        out
    }

    /// Invoice fields from the first recognized document, if any.
    pub fn invoice(&self) -> Option<InvoiceData> {
        let fields = &self.documents.first()?.fields;

        let items = fields
            .get("Items")
            .and_then(|f| f.value_array.as_ref())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.value_object.as_ref())
                    .map(|obj| LineItem {
                        quantity: field_number(obj, "Quantity"),
                        name: field_text(obj, "Description"),
                        unit_price: field_number(obj, "UnitPrice"),
                        total: field_number(obj, "Amount"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(InvoiceData {
            customer: Party {
                name: field_text(fields, "CustomerName"),
                address: field_text(fields, "CustomerAddress"),
            },
            vendor: Party {
                name: field_text(fields, "VendorName"),
                address: field_text(fields, "VendorAddress"),
            },
            invoice_number: field_text(fields, "InvoiceId"),
            invoice_date: field_text(fields, "InvoiceDate"),
            items,
            total: field_number(fields, "InvoiceTotal"),
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SentimentRequest<'a> {
    pub documents: Vec<SentimentInput<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct SentimentInput<'a> {
    pub id: &'a str,
    pub language: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct SentimentResponse {
    #[serde(default)]
    pub documents: Vec<SentimentDocument>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SentimentDocument {
    pub sentiment: String,
}
