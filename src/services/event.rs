//! Audit trail: recording and querying system events.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use super::ServiceError;
use crate::models::{Event, EventType};
use crate::repository::DieselEventRepository;

/// Criteria for listing events.
///
/// Only one criterion applies, by priority: type, then description, then
/// the date range (when both bounds are present), else everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct EventService {
    events: DieselEventRepository,
}

impl EventService {
    pub fn new(events: DieselEventRepository) -> Self {
        Self { events }
    }

    pub async fn create_event(
        &self,
        event_type: EventType,
        description: &str,
        user_id: Option<i32>,
        metadata: Option<Value>,
    ) -> Result<Event, ServiceError> {
        let metadata = metadata.unwrap_or_else(|| Value::Object(Default::default()));
        Ok(self
            .events
            .create(event_type, description, user_id, &metadata)
            .await?)
    }

    /// Record an event; a failed write is logged and otherwise ignored.
    pub async fn record(
        &self,
        event_type: EventType,
        description: &str,
        user_id: Option<i32>,
        metadata: Option<Value>,
    ) {
        if let Err(e) = self
            .create_event(event_type, description, user_id, metadata)
            .await
        {
            warn!("Failed to record {} event: {}", event_type, e);
        }
    }

    pub async fn get_events(&self, filter: &EventFilter) -> Result<Vec<Event>, ServiceError> {
        let events = if let Some(event_type) = filter.event_type {
            self.events.get_by_type(event_type).await?
        } else if let Some(ref text) = filter.description {
            self.events.get_by_description(text).await?
        } else if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            self.events.get_by_date_range(start, end).await?
        } else {
            self.events.get_all().await?
        };
        Ok(events)
    }
}
