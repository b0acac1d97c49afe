//! Diesel-based audit event repository for SQLite.
//!
//! Events are append-only; there is no update or delete.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{EventRecord, NewEventRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::{format_datetime, parse_datetime, parse_json_opt};
use crate::models::{Event, EventType};
use crate::schema::events;

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        Event {
            id: record.id,
            event_type: EventType::from_str(&record.event_type).unwrap_or_default(),
            description: record.description,
            user_id: record.user_id,
            metadata: parse_json_opt(
                record.metadata.as_deref(),
                serde_json::Value::Object(Default::default()),
            ),
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based event repository.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: AsyncSqlitePool,
}

impl DieselEventRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        event_type: EventType,
        description: &str,
        user_id: Option<i32>,
        metadata: &serde_json::Value,
    ) -> Result<Event, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = format_datetime(&Utc::now());
        let metadata = metadata.to_string();

        diesel::insert_into(events::table)
            .values(&NewEventRecord {
                event_type: event_type.as_str(),
                description,
                user_id,
                metadata: Some(metadata.as_str()),
                created_at: &now,
            })
            .returning(EventRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map(Event::from)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Event>, DieselError> {
        let mut conn = self.pool.get().await?;

        events::table
            .find(id)
            .select(EventRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Event::from))
    }

    pub async fn get_by_type(&self, event_type: EventType) -> Result<Vec<Event>, DieselError> {
        let mut conn = self.pool.get().await?;

        events::table
            .filter(events::event_type.eq(event_type.as_str()))
            .order(events::id.asc())
            .select(EventRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Event::from).collect())
    }

    /// Events created between `start` and `end`, both inclusive.
    pub async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>, DieselError> {
        let mut conn = self.pool.get().await?;

        events::table
            .filter(events::created_at.ge(format_datetime(&start)))
            .filter(events::created_at.le(format_datetime(&end)))
            .order(events::id.asc())
            .select(EventRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Event::from).collect())
    }

    /// Events whose description contains `text`, ignoring case.
    ///
    /// SQLite's `LIKE` only folds ASCII, so matching happens here with
    /// Unicode lowercasing.
    pub async fn get_by_description(&self, text: &str) -> Result<Vec<Event>, DieselError> {
        let mut conn = self.pool.get().await?;
        let needle = text.to_lowercase();

        let records: Vec<EventRecord> = events::table
            .order(events::id.asc())
            .select(EventRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(records
            .into_iter()
            .filter(|record| record.description.to_lowercase().contains(&needle))
            .map(Event::from)
            .collect())
    }

    pub async fn get_all(&self) -> Result<Vec<Event>, DieselError> {
        let mut conn = self.pool.get().await?;

        events::table
            .order(events::id.asc())
            .select(EventRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Event::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DieselDbContext;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::tempdir;

    async fn setup() -> (DieselEventRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::from_sqlite_path(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx.events(), dir)
    }

    #[tokio::test]
    async fn test_create_and_filter_events() {
        let (repo, _dir) = setup().await;

        let login = repo
            .create(
                EventType::UserInteraction,
                "User alice logged in",
                None,
                &json!({"username": "alice"}),
            )
            .await
            .unwrap();
        repo.create(EventType::FileUpload, "Uploaded SALES.csv", Some(1), &json!({}))
            .await
            .unwrap();
        repo.create(EventType::FileUpload, "Uploaded 50%_off.csv", Some(1), &json!({}))
            .await
            .unwrap();

        let fetched = repo.get_by_id(login.id).await.unwrap().unwrap();
        assert_eq!(fetched.metadata["username"], "alice");
        assert_eq!(fetched.event_type, EventType::UserInteraction);

        assert_eq!(repo.get_by_type(EventType::FileUpload).await.unwrap().len(), 2);
        assert!(repo.get_by_type(EventType::TokenRenewal).await.unwrap().is_empty());

        let sales = repo.get_by_description("sales").await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].description, "Uploaded SALES.csv");

        // Wildcards in the search text match literally
        let percent = repo.get_by_description("50%_").await.unwrap();
        assert_eq!(percent.len(), 1);
        assert!(repo.get_by_description("5_%").await.unwrap().is_empty());

        assert_eq!(repo.get_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_description_search_folds_accented_letters() {
        let (repo, _dir) = setup().await;
        repo.create(
            EventType::AiProcessing,
            "Análisis de FACTURA_ÑANDÚ.pdf completado",
            Some(1),
            &json!({}),
        )
        .await
        .unwrap();
        repo.create(EventType::AiProcessing, "Analysis finished", Some(1), &json!({}))
            .await
            .unwrap();

        let found = repo.get_by_description("ANÁLISIS").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].description.starts_with("Análisis"));

        assert_eq!(repo.get_by_description("factura_ñandú").await.unwrap().len(), 1);
        assert_eq!(repo.get_by_description("an").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let (repo, _dir) = setup().await;
        let event = repo
            .create(EventType::TokenRenewal, "renewed", Some(1), &json!({}))
            .await
            .unwrap();

        let exact = repo
            .get_by_date_range(event.created_at, event.created_at)
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let before = repo
            .get_by_date_range(
                event.created_at - Duration::hours(2),
                event.created_at - Duration::hours(1),
            )
            .await
            .unwrap();
        assert!(before.is_empty());
    }
}
