//! Diesel database context for connection management and repository access.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_document::DieselDocumentRepository;
use super::diesel_event::DieselEventRepository;
use super::diesel_file::DieselFileRepository;
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::diesel_user::DieselUserRepository;

/// Diesel database context that owns the connection factory and hands out
/// repositories.
///
/// # Example
/// ```ignore
/// let ctx = DieselDbContext::from_url("sqlite:data/docanalysis.db");
/// ctx.init_schema().await?;
/// let user = ctx.users().get_by_username("demo_user").await?;
/// ```
#[derive(Clone)]
pub struct DieselDbContext {
    pool: AsyncSqlitePool,
}

impl DieselDbContext {
    /// Create a context from a database URL (`sqlite:path` or a plain path).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Create a context from a SQLite file path.
    pub fn from_sqlite_path(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Get the underlying connection factory.
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    pub fn users(&self) -> DieselUserRepository {
        DieselUserRepository::new(self.pool.clone())
    }

    pub fn documents(&self) -> DieselDocumentRepository {
        DieselDocumentRepository::new(self.pool.clone())
    }

    pub fn files(&self) -> DieselFileRepository {
        DieselFileRepository::new(self.pool.clone())
    }

    pub fn events(&self) -> DieselEventRepository {
        DieselEventRepository::new(self.pool.clone())
    }

    /// Open a connection and run a trivial statement.
    pub async fn test_connection(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute("SELECT 1").await
    }

    /// Create all tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                document_type TEXT NOT NULL DEFAULT 'unknown',
                file_path TEXT NOT NULL,
                extracted_data TEXT,
                sentiment TEXT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                s3_key TEXT NOT NULL UNIQUE,
                s3_url TEXT,
                file_size BIGINT NOT NULL,
                content_type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                validations TEXT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                description TEXT NOT NULL,
                user_id INTEGER REFERENCES users(id),
                metadata TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_user ON documents(user_id);
            CREATE INDEX IF NOT EXISTS idx_documents_type ON documents(document_type);
            CREATE INDEX IF NOT EXISTS idx_files_user ON files(user_id);
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(event_type);
            CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at);
            "#,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::from_sqlite_path(&dir.path().join("test.db"));

        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();
        ctx.test_connection().await.unwrap();
    }
}
