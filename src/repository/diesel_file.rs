//! Diesel-based uploaded-file repository for SQLite.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{FileRecord, NewFileRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::{format_datetime, parse_datetime};
use crate::models::{FileStatus, NewStoredFile, StoredFile, ValidationIssue};
use crate::schema::files;

impl From<FileRecord> for StoredFile {
    fn from(record: FileRecord) -> Self {
        StoredFile {
            id: record.id,
            filename: record.filename,
            s3_key: record.s3_key,
            s3_url: record.s3_url,
            file_size: record.file_size,
            content_type: record.content_type,
            status: FileStatus::from_str(&record.status).unwrap_or_default(),
            validations: record
                .validations
                .as_deref()
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or_default(),
            user_id: record.user_id,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

fn validations_json(validations: &[ValidationIssue]) -> String {
    serde_json::to_string(validations).unwrap_or_else(|_| "[]".to_string())
}

/// Diesel-based file repository.
#[derive(Clone)]
pub struct DieselFileRepository {
    pool: AsyncSqlitePool,
}

impl DieselFileRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, file: &NewStoredFile) -> Result<StoredFile, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());
        let validations = validations_json(&file.validations);

        diesel::insert_into(files::table)
            .values(&NewFileRecord {
                filename: &file.filename,
                s3_key: &file.s3_key,
                s3_url: file.s3_url.as_deref(),
                file_size: file.file_size,
                content_type: &file.content_type,
                status: file.status.as_str(),
                validations: Some(validations.as_str()),
                user_id: file.user_id,
                created_at: &now,
                updated_at: &now,
            })
            .returning(FileRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(StoredFile::from)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<StoredFile>, DieselError> {
        let mut conn = self.pool.get().await?;

        files::table
            .find(id)
            .select(FileRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(StoredFile::from))
    }

    pub async fn get_by_user_id(&self, user_id: i32) -> Result<Vec<StoredFile>, DieselError> {
        let mut conn = self.pool.get().await?;

        files::table
            .filter(files::user_id.eq(user_id))
            .order(files::id.asc())
            .select(FileRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(StoredFile::from).collect())
    }

    /// Persist status, URL and validations; returns `file` unchanged if it no longer exists.
    pub async fn update(&self, file: &StoredFile) -> Result<StoredFile, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());
        let validations = validations_json(&file.validations);

        let updated = diesel::update(files::table.find(file.id))
            .set((
                files::filename.eq(&file.filename),
                files::s3_url.eq(file.s3_url.as_deref()),
                files::file_size.eq(file.file_size),
                files::content_type.eq(&file.content_type),
                files::status.eq(file.status.as_str()),
                files::validations.eq(Some(validations.as_str())),
                files::updated_at.eq(&now),
            ))
            .returning(FileRecord::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;

        Ok(updated.map(StoredFile::from).unwrap_or_else(|| file.clone()))
    }

    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(files::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(rows > 0)
    }
}
