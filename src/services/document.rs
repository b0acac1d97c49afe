//! Document analysis use case.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{store_new_object, ServiceError};
use crate::cognitive::DocumentAnalyzer;
use crate::models::{Document, DocumentType, NewDocument};
use crate::repository::DieselDocumentRepository;
use crate::storage::ObjectStore;

/// Extensions accepted for analysis.
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".pdf", ".jpg", ".jpeg", ".png"];

/// Result of analyzing one document.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub document_id: i32,
    pub document_type: DocumentType,
    pub extracted_data: serde_json::Value,
    pub sentiment: Option<String>,
}

/// Whether `filename` has an extension accepted for analysis.
pub fn is_allowed_document(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Prefix of analyzed document object keys.
pub const DOCUMENT_PREFIX: &str = "documents";

#[derive(Clone)]
pub struct DocumentService {
    documents: DieselDocumentRepository,
    store: Arc<dyn ObjectStore>,
    analyzer: Arc<dyn DocumentAnalyzer>,
}

impl DocumentService {
    pub fn new(
        documents: DieselDocumentRepository,
        store: Arc<dyn ObjectStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> Self {
        Self {
            documents,
            store,
            analyzer,
        }
    }

    /// Analyze a document, keep the original and record the outcome.
    ///
    /// The original is only stored once analysis has succeeded.
    pub async fn analyze_document(
        &self,
        content: Vec<u8>,
        filename: &str,
        content_type: &str,
        user_id: i32,
    ) -> Result<AnalysisResponse, ServiceError> {
        let content_type = if content_type.is_empty() {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        } else {
            content_type.to_string()
        };

        let analysis = self.analyzer.analyze(&content, &content_type).await?;
        let (key, _url) = store_new_object(
            self.store.as_ref(),
            DOCUMENT_PREFIX,
            user_id,
            filename,
            Utc::now(),
            &content,
            &content_type,
        )
        .await?;

        let document_type = analysis.document_type();
        let sentiment = match document_type {
            DocumentType::Information => analysis.sentiment().map(str::to_string),
            _ => None,
        };

        let document = match self
            .documents
            .create(&NewDocument {
                filename: filename.to_string(),
                document_type,
                file_path: key.clone(),
                extracted_data: analysis.to_json(),
                sentiment,
                user_id,
            })
            .await
        {
            Ok(document) => document,
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    warn!("Failed to remove {} after database error: {}", key, cleanup);
                }
                return Err(e.into());
            }
        };

        info!(
            "Analyzed {} as {} (document {})",
            document.filename, document.document_type, document.id
        );

        Ok(AnalysisResponse {
            document_id: document.id,
            document_type: document.document_type,
            extracted_data: document.extracted_data,
            sentiment: document.sentiment,
        })
    }

    /// A user's documents, optionally restricted to one type.
    pub async fn list_for_user(
        &self,
        user_id: i32,
        document_type: Option<DocumentType>,
    ) -> Result<Vec<Document>, ServiceError> {
        let documents = self.documents.get_by_user_id(user_id).await?;
        Ok(match document_type {
            Some(t) => documents
                .into_iter()
                .filter(|d| d.document_type == t)
                .collect(),
            None => documents,
        })
    }

    pub async fn get_for_user(&self, id: i32, user_id: i32) -> Result<Option<Document>, ServiceError> {
        Ok(self
            .documents
            .get_by_id(id)
            .await?
            .filter(|doc| doc.user_id == user_id))
    }

    pub async fn delete_for_user(&self, id: i32, user_id: i32) -> Result<bool, ServiceError> {
        let Some(document) = self.get_for_user(id, user_id).await? else {
            return Ok(false);
        };

        if !self.store.delete(&document.file_path).await? {
            warn!("Object {} was already gone", document.file_path);
        }
        Ok(self.documents.delete(document.id).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cognitive::{
        AnalysisResult, CognitiveError, InformationData, InvoiceData, NEUTRAL_SENTIMENT,
    };
    use crate::repository::DieselDbContext;
    use crate::storage::LocalStore;
    use async_trait::async_trait;
    use tempfile::tempdir;

    /// Analyzer that classifies by content prefix.
    pub(crate) struct FakeAnalyzer;

    #[async_trait]
    impl DocumentAnalyzer for FakeAnalyzer {
        async fn analyze(
            &self,
            content: &[u8],
            _content_type: &str,
        ) -> Result<AnalysisResult, CognitiveError> {
            if content.starts_with(b"invoice") {
                Ok(AnalysisResult::Invoice(InvoiceData {
                    invoice_number: Some("F-001".to_string()),
                    total: Some(99.5),
                    ..Default::default()
                }))
            } else if content.starts_with(b"broken") {
                Err(CognitiveError::AnalysisFailed("unreadable".to_string()))
            } else {
                Ok(AnalysisResult::Information(InformationData::from_text(
                    &String::from_utf8_lossy(content),
                    NEUTRAL_SENTIMENT.to_string(),
                )))
            }
        }
    }

    async fn setup() -> (DocumentService, LocalStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let store = LocalStore::new(dir.path().join("objects"));
        let service = DocumentService::new(
            ctx.documents(),
            Arc::new(store.clone()),
            Arc::new(FakeAnalyzer),
        );
        (service, store, dir)
    }

    #[test]
    fn test_allowed_extensions() {
        assert!(is_allowed_document("scan.PDF"));
        assert!(is_allowed_document("photo.jpeg"));
        assert!(!is_allowed_document("notes.txt"));
        assert!(!is_allowed_document("pdf"));
    }

    #[tokio::test]
    async fn test_invoice_has_no_sentiment() {
        let (service, store, _dir) = setup().await;
        let response = service
            .analyze_document(b"invoice #1".to_vec(), "f.pdf", "application/pdf", 5)
            .await
            .unwrap();

        assert_eq!(response.document_type, DocumentType::Invoice);
        assert!(response.sentiment.is_none());
        assert_eq!(response.extracted_data["invoice_number"], "F-001");
        assert_eq!(response.extracted_data["document_type"], "invoice");

        let doc = service.get_for_user(response.document_id, 5).await.unwrap().unwrap();
        assert!(doc.file_path.starts_with("documents/5/"));
        assert!(store.root().join(&doc.file_path).exists());
    }

    #[tokio::test]
    async fn test_information_keeps_sentiment_and_filters() {
        let (service, _store, _dir) = setup().await;
        service
            .analyze_document(b"meeting notes".to_vec(), "n.png", "", 5)
            .await
            .unwrap();
        service
            .analyze_document(b"invoice".to_vec(), "i.pdf", "application/pdf", 5)
            .await
            .unwrap();

        let info = service
            .list_for_user(5, Some(DocumentType::Information))
            .await
            .unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].sentiment.as_deref(), Some("neutral"));
        assert_eq!(service.list_for_user(5, None).await.unwrap().len(), 2);
        assert!(service.list_for_user(6, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_analysis_records_nothing() {
        let (service, store, _dir) = setup().await;
        let err = service
            .analyze_document(b"broken".to_vec(), "b.pdf", "application/pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Analysis(_)));
        assert!(service.list_for_user(5, None).await.unwrap().is_empty());
        assert!(!store.root().join("documents").exists());
    }

    #[tokio::test]
    async fn test_repeated_document_keeps_separate_originals() {
        let (service, store, _dir) = setup().await;
        let first = service
            .analyze_document(b"first notes".to_vec(), "scan.png", "image/png", 5)
            .await
            .unwrap();
        let second = service
            .analyze_document(b"second notes".to_vec(), "scan.png", "image/png", 5)
            .await
            .unwrap();

        let first = service.get_for_user(first.document_id, 5).await.unwrap().unwrap();
        let second = service.get_for_user(second.document_id, 5).await.unwrap().unwrap();
        assert_ne!(first.file_path, second.file_path);

        assert!(service.delete_for_user(second.id, 5).await.unwrap());
        assert_eq!(
            std::fs::read(store.root().join(&first.file_path)).unwrap(),
            b"first notes"
        );
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let (service, store, _dir) = setup().await;
        let response = service
            .analyze_document(b"some text".to_vec(), "t.jpg", "image/jpeg", 5)
            .await
            .unwrap();
        let doc = service.get_for_user(response.document_id, 5).await.unwrap().unwrap();

        assert!(!service.delete_for_user(doc.id, 6).await.unwrap());
        assert!(service.delete_for_user(doc.id, 5).await.unwrap());
        assert!(!store.root().join(doc.file_path).exists());
    }
}
