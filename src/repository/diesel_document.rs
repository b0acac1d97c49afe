//! Diesel-based document repository for SQLite.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{DocumentRecord, NewDocumentRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::{format_datetime, parse_datetime, parse_json_opt};
use crate::models::{Document, DocumentType, NewDocument};
use crate::schema::documents;

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Document {
            id: record.id,
            filename: record.filename,
            document_type: DocumentType::from_str(&record.document_type).unwrap_or_default(),
            file_path: record.file_path,
            extracted_data: parse_json_opt(
                record.extracted_data.as_deref(),
                serde_json::Value::Object(Default::default()),
            ),
            sentiment: record.sentiment,
            user_id: record.user_id,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Diesel-based document repository.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: AsyncSqlitePool,
}

impl DieselDocumentRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, doc: &NewDocument) -> Result<Document, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());
        let extracted = doc.extracted_data.to_string();

        diesel::insert_into(documents::table)
            .values(&NewDocumentRecord {
                filename: &doc.filename,
                document_type: doc.document_type.as_str(),
                file_path: &doc.file_path,
                extracted_data: Some(extracted.as_str()),
                sentiment: doc.sentiment.as_deref(),
                user_id: doc.user_id,
                created_at: &now,
                updated_at: &now,
            })
            .returning(DocumentRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(Document::from)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Document>, DieselError> {
        let mut conn = self.pool.get().await?;

        documents::table
            .find(id)
            .select(DocumentRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Document::from))
    }

    pub async fn get_by_user_id(&self, user_id: i32) -> Result<Vec<Document>, DieselError> {
        let mut conn = self.pool.get().await?;

        documents::table
            .filter(documents::user_id.eq(user_id))
            .order(documents::id.asc())
            .select(DocumentRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Document::from).collect())
    }

    pub async fn get_by_type(&self, doc_type: DocumentType) -> Result<Vec<Document>, DieselError> {
        let mut conn = self.pool.get().await?;

        documents::table
            .filter(documents::document_type.eq(doc_type.as_str()))
            .order(documents::id.asc())
            .select(DocumentRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Document::from).collect())
    }

    /// Persist the mutable fields of `doc`; returns `doc` unchanged if it no longer exists.
    pub async fn update(&self, doc: &Document) -> Result<Document, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());
        let extracted = doc.extracted_data.to_string();

        let updated = diesel::update(documents::table.find(doc.id))
            .set((
                documents::filename.eq(&doc.filename),
                documents::document_type.eq(doc.document_type.as_str()),
                documents::file_path.eq(&doc.file_path),
                documents::extracted_data.eq(Some(extracted.as_str())),
                documents::sentiment.eq(doc.sentiment.as_deref()),
                documents::updated_at.eq(&now),
            ))
            .returning(DocumentRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(updated.map(Document::from).unwrap_or_else(|| doc.clone()))
    }

    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(documents::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repository::DieselDbContext;
    use serde_json::json;
    use tempfile::tempdir;

    fn new_doc(user_id: i32, doc_type: DocumentType) -> NewDocument {
        NewDocument {
            filename: "scan.pdf".to_string(),
            document_type: doc_type,
            file_path: format!("documents/{}/scan.pdf", user_id),
            extracted_data: json!({"document_type": doc_type.as_str()}),
            sentiment: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_document_crud() {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let user = ctx
            .users()
            .create(&NewUser::new("u", "u@example.com", "h".to_string()))
            .await
            .unwrap();
        let repo = ctx.documents();

        let invoice = repo.create(&new_doc(user.id, DocumentType::Invoice)).await.unwrap();
        let info = repo
            .create(&new_doc(user.id, DocumentType::Information))
            .await
            .unwrap();
        assert_eq!(invoice.extracted_data["document_type"], "invoice");

        let mine = repo.get_by_user_id(user.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].id, invoice.id);
        assert!(repo.get_by_user_id(user.id + 1).await.unwrap().is_empty());

        let invoices = repo.get_by_type(DocumentType::Invoice).await.unwrap();
        assert_eq!(invoices.len(), 1);

        let mut changed = info.clone();
        changed.sentiment = Some("positive".to_string());
        let updated = repo.update(&changed).await.unwrap();
        assert_eq!(updated.sentiment.as_deref(), Some("positive"));

        assert!(repo.delete(invoice.id).await.unwrap());
        assert!(repo.get_by_id(invoice.id).await.unwrap().is_none());
        assert!(repo.get_by_id(info.id).await.unwrap().is_some());
    }
}
