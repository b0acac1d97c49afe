//! Audit history endpoints.

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::super::auth::AuthUser;
use super::super::error::ApiError;
use super::super::AppState;
use super::helpers::{non_empty, parse_datetime_param};
use crate::models::{Event, EventType};
use crate::services::{timestamp_slug, EventFilter, ExportFormat};

/// Query params for listing and exporting events.
#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub event_type: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Export format (xlsx, csv, json); ignored when listing.
    pub format: Option<String>,
}

impl EventQuery {
    fn to_filter(&self) -> Result<EventFilter, ApiError> {
        let event_type = match non_empty(&self.event_type) {
            Some(value) => Some(
                EventType::from_str(value)
                    .ok_or_else(|| ApiError::BadRequest(format!("Invalid event type: {}", value)))?,
            ),
            None => None,
        };

        let parse_date = |value: &Option<String>, name: &str| match non_empty(value) {
            Some(raw) => parse_datetime_param(raw)
                .map(Some)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid {}: {}", name, raw))),
            None => Ok(None),
        };

        Ok(EventFilter {
            event_type,
            description: non_empty(&self.description).map(str::to_string),
            start_date: parse_date(&self.start_date, "start_date")?,
            end_date: parse_date(&self.end_date, "end_date")?,
        })
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<EventQuery>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let filter = params.to_filter()?;
    Ok(Json(state.events.get_events(&filter).await?))
}

/// Export filtered events as an attachment.
pub async fn export_events(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<EventQuery>,
) -> Result<Response, ApiError> {
    let format = match non_empty(&params.format) {
        Some(value) => ExportFormat::from_str(value)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid export format: {}", value)))?,
        None => ExportFormat::default(),
    };
    let filter = params.to_filter()?;

    let events = state.events.get_events(&filter).await?;
    let content = format
        .render(&events)
        .map_err(|e| ApiError::internal("Export failed", e))?;

    let filename = format!(
        "events_{}.{}",
        timestamp_slug(Utc::now()),
        format.extension()
    );

    Response::builder()
        .header(header::CONTENT_TYPE, format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(content))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
