//! Azure Form Recognizer and Text Analytics client.
//!
//! Analysis is asynchronous on the service side: a document is submitted,
//! the service answers with an `Operation-Location` URL, and that URL is
//! polled until the operation succeeds or fails.
//!
//! Rate limiting:
//! - Automatically retries on 429 with exponential backoff
//! - Respects Retry-After header from API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};

use super::response::{
    AnalyzeOperation, AnalyzeResult, SentimentInput, SentimentRequest, SentimentResponse,
};
use super::{
    truncate_chars, AnalysisResult, CognitiveError, DocumentAnalyzer, InformationData,
    NEUTRAL_SENTIMENT,
};
use crate::config::AzureSettings;

/// Maximum retry attempts on rate limit errors.
const MAX_RETRIES: u32 = 5;

const FORM_RECOGNIZER_API_VERSION: &str = "2023-07-31";
const INVOICE_MODEL: &str = "prebuilt-invoice";
const READ_MODEL: &str = "prebuilt-read";

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Language sent with sentiment requests.
const SENTIMENT_LANGUAGE: &str = "es";

/// Text shorter than this (after trimming) is not worth scoring.
const MIN_SENTIMENT_CHARS: usize = 10;

/// Text Analytics rejects longer documents.
const MAX_SENTIMENT_CHARS: usize = 5120;

#[derive(Debug, Clone)]
struct ServiceEndpoint {
    url: String,
    key: String,
}

impl ServiceEndpoint {
    fn from_parts(url: Option<&String>, key: Option<&String>) -> Option<Self> {
        match (url, key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some(Self {
                url: url.trim_end_matches('/').to_string(),
                key: key.clone(),
            }),
            _ => None,
        }
    }
}

/// Document analyzer backed by Azure cognitive services.
#[derive(Debug, Clone)]
pub struct AzureAnalyzer {
    client: Client,
    form_recognizer: Option<ServiceEndpoint>,
    text_analytics: Option<ServiceEndpoint>,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureAnalyzer {
    pub fn from_settings(settings: &AzureSettings) -> Result<Self, CognitiveError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        let analyzer = Self {
            client,
            form_recognizer: ServiceEndpoint::from_parts(
                settings.form_recognizer_endpoint.as_ref(),
                settings.form_recognizer_key.as_ref(),
            ),
            text_analytics: ServiceEndpoint::from_parts(
                settings.text_analytics_endpoint.as_ref(),
                settings.text_analytics_key.as_ref(),
            ),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            max_polls: settings.max_polls,
        };

        if analyzer.form_recognizer.is_none() {
            warn!("Form Recognizer endpoint/key not set; document analysis will fail");
        }
        if analyzer.text_analytics.is_none() {
            info!("Text Analytics endpoint/key not set; sentiment defaults to neutral");
        }

        Ok(analyzer)
    }

    /// Run a prebuilt model over `content` and wait for its result.
    async fn run_model(
        &self,
        model: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<AnalyzeResult, CognitiveError> {
        let endpoint = self
            .form_recognizer
            .as_ref()
            .ok_or(CognitiveError::NotConfigured("Form Recognizer"))?;

        let url = format!(
            "{}/formrecognizer/documentModels/{}:analyze?api-version={}",
            endpoint.url, model, FORM_RECOGNIZER_API_VERSION
        );
        debug!("Submitting {} bytes to {}", content.len(), model);

        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .header(SUBSCRIPTION_KEY_HEADER, &endpoint.key)
                    .header(CONTENT_TYPE, content_type)
                    .body(content.to_vec())
            })
            .await?;

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                CognitiveError::AnalysisFailed("response had no Operation-Location".to_string())
            })?;

        for poll in 0..self.max_polls {
            let response = self
                .send_with_retry(|| {
                    self.client
                        .get(&operation_url)
                        .header(SUBSCRIPTION_KEY_HEADER, &endpoint.key)
                })
                .await?;
            let wait = retry_after(response.headers()).unwrap_or(self.poll_interval);
            let operation: AnalyzeOperation = response.json().await?;

            match operation.status.as_str() {
                "succeeded" => {
                    debug!("{} finished after {} polls", model, poll + 1);
                    return Ok(operation.analyze_result.unwrap_or_default());
                }
                "failed" => {
                    let message = operation
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(CognitiveError::AnalysisFailed(message));
                }
                _ => tokio::time::sleep(wait).await,
            }
        }

        Err(CognitiveError::Timeout(self.max_polls))
    }

    /// Send a request, retrying on 429 with exponential backoff.
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, CognitiveError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let response = build().send().await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());

                if attempt >= MAX_RETRIES {
                    return Err(CognitiveError::RateLimited { retry_after_secs });
                }

                let wait = retry_after(response.headers())
                    .unwrap_or_else(|| backoff_delay(attempt, 1000));
                warn!(
                    "Cognitive service rate limited (attempt {}), waiting {:?}",
                    attempt + 1,
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(CognitiveError::Api { status, body });
            }

            return Ok(response);
        }
    }

    /// Recognize an invoice; `Ok(None)` when the model found no invoice.
    pub async fn analyze_invoice(
        &self,
        content: &[u8],
        content_type: &str,
    ) -> Result<Option<super::InvoiceData>, CognitiveError> {
        let result = self.run_model(INVOICE_MODEL, content, content_type).await?;
        Ok(result.invoice())
    }

    /// Plain text of every line on every page.
    pub async fn extract_text(
        &self,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, CognitiveError> {
        let result = self.run_model(READ_MODEL, content, content_type).await?;
        Ok(result.text())
    }

    /// Lowercased sentiment label; `neutral` for short text or on any failure.
    pub async fn sentiment(&self, text: &str) -> String {
        if text.trim().chars().count() < MIN_SENTIMENT_CHARS {
            return NEUTRAL_SENTIMENT.to_string();
        }

        match self.request_sentiment(text).await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!("Sentiment analysis failed, using neutral: {}", e);
                NEUTRAL_SENTIMENT.to_string()
            }
        }
    }

    async fn request_sentiment(&self, text: &str) -> Result<String, CognitiveError> {
        let endpoint = self
            .text_analytics
            .as_ref()
            .ok_or(CognitiveError::NotConfigured("Text Analytics"))?;

        let url = format!("{}/text/analytics/v3.1/sentiment", endpoint.url);
        let text = truncate_chars(text, MAX_SENTIMENT_CHARS);
        let request = SentimentRequest {
            documents: vec![SentimentInput {
                id: "1",
                language: SENTIMENT_LANGUAGE,
                text: &text,
            }],
        };

        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .header(SUBSCRIPTION_KEY_HEADER, &endpoint.key)
                    .json(&request)
            })
            .await?;
        let body: SentimentResponse = response.json().await?;

        if let Some(error) = body.errors.first() {
            return Err(CognitiveError::AnalysisFailed(error.to_string()));
        }

        body.documents
            .into_iter()
            .next()
            .map(|d| d.sentiment.to_lowercase())
            .ok_or_else(|| CognitiveError::AnalysisFailed("no sentiment returned".to_string()))
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureAnalyzer {
    async fn analyze(
        &self,
        content: &[u8],
        content_type: &str,
    ) -> Result<AnalysisResult, CognitiveError> {
        match self.analyze_invoice(content, content_type).await {
            Ok(Some(invoice)) => return Ok(AnalysisResult::Invoice(invoice)),
            Ok(None) => debug!("No invoice recognized, reading as text"),
            Err(e) => warn!("Invoice analysis failed, reading as text: {}", e),
        }

        let text = self.extract_text(content, content_type).await?;
        let sentiment = self.sentiment(&text).await;
        Ok(AnalysisResult::Information(InformationData::from_text(
            &text, sentiment,
        )))
    }
}

/// Seconds from a Retry-After header, capped at a minute.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Exponential backoff delay for a given attempt.
fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms * 2u64.pow(attempt);
    Duration::from_millis(delay_ms.min(60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// How the mock service behaves.
    #[derive(Clone, Copy, PartialEq)]
    enum Scenario {
        InvoiceFound,
        NoInvoice,
        /// Answer the first `n` submissions with 429, then find an invoice.
        RateLimited(usize),
        /// The invoice submission itself is rejected with a 500.
        InvoiceRejected,
        /// The invoice operation reports `failed`.
        InvoiceFails,
        /// Operations never leave `running`.
        NeverFinishes,
    }

    #[derive(Clone)]
    struct MockService {
        base: String,
        scenario: Scenario,
        submits: Arc<AtomicUsize>,
        polls: Arc<AtomicUsize>,
    }

    async fn submit(
        State(mock): State<MockService>,
        Path(action): Path<String>,
        headers: AxumHeaders,
    ) -> impl IntoResponse {
        if headers.get(SUBSCRIPTION_KEY_HEADER).is_none() {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        let count = mock.submits.fetch_add(1, Ordering::SeqCst);
        let model = action.trim_end_matches(":analyze").to_string();

        match mock.scenario {
            Scenario::RateLimited(n) if count < n => {
                return (AxumStatus::TOO_MANY_REQUESTS, [("retry-after", "0")]).into_response();
            }
            Scenario::InvoiceRejected if model == INVOICE_MODEL => {
                return (AxumStatus::INTERNAL_SERVER_ERROR, "model unavailable").into_response();
            }
            _ => {}
        }

        (
            AxumStatus::ACCEPTED,
            [("operation-location", format!("{}/operations/{}", mock.base, model))],
        )
            .into_response()
    }

    async fn operation(State(mock): State<MockService>, Path(model): Path<String>) -> Json<Value> {
        // Every other poll reports the operation as still running
        let poll = mock.polls.fetch_add(1, Ordering::SeqCst);
        if mock.scenario == Scenario::NeverFinishes || poll % 2 == 0 {
            return Json(json!({"status": "running"}));
        }
        if model == INVOICE_MODEL && mock.scenario == Scenario::InvoiceFails {
            return Json(json!({
                "status": "failed",
                "error": {"code": "InvalidContent", "message": "The file is corrupted"}
            }));
        }

        let invoice_found = matches!(
            mock.scenario,
            Scenario::InvoiceFound | Scenario::RateLimited(_)
        );
        let result = if model == INVOICE_MODEL && invoice_found {
            json!({"documents": [{"fields": {
                "InvoiceId": {"valueString": "F-1"},
                "InvoiceTotal": {"valueCurrency": {"amount": 12.0}}
            }}]})
        } else if model == INVOICE_MODEL {
            json!({"documents": []})
        } else {
            json!({"pages": [{"lines": [
                {"content": "El servicio fue excelente"},
                {"content": "Muy recomendable"}
            ]}]})
        };
        Json(json!({"status": "succeeded", "analyzeResult": result}))
    }

    async fn sentiment(Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(body["documents"][0]["language"], "es");
        Json(json!({"documents": [{"id": "1", "sentiment": "Positive"}], "errors": []}))
    }

    async fn start_mock(scenario: Scenario) -> (AzureAnalyzer, MockService) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let mock = MockService {
            base: base.clone(),
            scenario,
            submits: Arc::new(AtomicUsize::new(0)),
            polls: Arc::new(AtomicUsize::new(0)),
        };
        let app = Router::new()
            .route("/formrecognizer/documentModels/:action", post(submit))
            .route("/operations/:model", get(operation))
            .route("/text/analytics/v3.1/sentiment", post(sentiment))
            .with_state(mock.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let analyzer = AzureAnalyzer::from_settings(&AzureSettings {
            form_recognizer_endpoint: Some(format!("{}/", base)),
            form_recognizer_key: Some("fr-key".to_string()),
            text_analytics_endpoint: Some(base),
            text_analytics_key: Some("ta-key".to_string()),
            poll_interval_ms: 10,
            max_polls: 5,
            request_timeout_secs: 5,
        })
        .unwrap();
        (analyzer, mock)
    }

    fn expect_information(result: AnalysisResult) -> InformationData {
        match result {
            AnalysisResult::Information(info) => info,
            other => panic!("expected information, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoice_is_recognized() {
        let (analyzer, _mock) = start_mock(Scenario::InvoiceFound).await;
        let result = analyzer.analyze(b"%PDF-1.4", "application/pdf").await.unwrap();

        match result {
            AnalysisResult::Invoice(invoice) => {
                assert_eq!(invoice.invoice_number.as_deref(), Some("F-1"));
                assert_eq!(invoice.total, Some(12.0));
            }
            other => panic!("expected invoice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_text_with_sentiment() {
        let (analyzer, _mock) = start_mock(Scenario::NoInvoice).await;
        let info = expect_information(analyzer.analyze(b"\x89PNG", "image/png").await.unwrap());

        assert_eq!(
            info.description,
            "El servicio fue excelente\nMuy recomendable\n"
        );
        assert_eq!(info.sentiment, "positive");
    }

    #[tokio::test]
    async fn test_rate_limited_submission_is_retried() {
        let (analyzer, mock) = start_mock(Scenario::RateLimited(2)).await;
        let result = analyzer.analyze(b"%PDF-1.4", "application/pdf").await.unwrap();

        assert_eq!(result.document_type(), crate::models::DocumentType::Invoice);
        assert_eq!(mock.submits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_max_retries() {
        let (analyzer, mock) = start_mock(Scenario::RateLimited(usize::MAX)).await;
        let err = analyzer
            .analyze_invoice(b"%PDF-1.4", "application/pdf")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CognitiveError::RateLimited {
                retry_after_secs: Some(0)
            }
        ));
        assert_eq!(
            mock.submits.load(Ordering::SeqCst),
            MAX_RETRIES as usize + 1
        );
    }

    #[tokio::test]
    async fn test_failed_operation_reports_service_error() {
        let (analyzer, _mock) = start_mock(Scenario::InvoiceFails).await;
        let err = analyzer
            .analyze_invoice(b"%PDF-1.4", "application/pdf")
            .await
            .unwrap_err();

        match err {
            CognitiveError::AnalysisFailed(message) => {
                assert_eq!(message, "InvalidContent: The file is corrupted")
            }
            other => panic!("expected analysis failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_invoice_operation_falls_back_to_read() {
        let (analyzer, _mock) = start_mock(Scenario::InvoiceFails).await;
        let info = expect_information(analyzer.analyze(b"%PDF-1.4", "application/pdf").await.unwrap());
        assert_eq!(info.sentiment, "positive");
    }

    #[tokio::test]
    async fn test_rejected_invoice_call_falls_back_to_read() {
        let (analyzer, mock) = start_mock(Scenario::InvoiceRejected).await;
        let info = expect_information(analyzer.analyze(b"%PDF-1.4", "application/pdf").await.unwrap());

        assert_eq!(info.summary, "El servicio fue excelente\nMuy recomendable\n");
        // One rejected invoice submission, one read submission
        assert_eq!(mock.submits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unfinished_operation_times_out() {
        let (analyzer, mock) = start_mock(Scenario::NeverFinishes).await;
        let err = analyzer
            .extract_text(b"\x89PNG", "image/png")
            .await
            .unwrap_err();

        assert!(matches!(err, CognitiveError::Timeout(5)));
        assert_eq!(mock.polls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_sentiment_short_text_or_unconfigured_is_neutral() {
        let analyzer = AzureAnalyzer::from_settings(&AzureSettings::default()).unwrap();
        assert_eq!(analyzer.sentiment("   ok   ").await, "neutral");
        assert_eq!(
            analyzer.sentiment("a long enough piece of text").await,
            "neutral"
        );
    }

    #[tokio::test]
    async fn test_unconfigured_analysis_fails() {
        let analyzer = AzureAnalyzer::from_settings(&AzureSettings::default()).unwrap();
        let err = analyzer.analyze(b"data", "application/pdf").await.unwrap_err();
        assert!(matches!(err, CognitiveError::NotConfigured(_)));
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        assert_eq!(backoff_delay(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3, 1000), Duration::from_millis(8000));
        assert_eq!(backoff_delay(10, 1000), Duration::from_secs(60));
    }
}
