//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite with compile-time query
//! checking.

pub mod diesel_context;
pub mod diesel_document;
pub mod diesel_event;
pub mod diesel_file;
pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_user;
pub mod util;

pub use diesel_context::DieselDbContext;
pub use diesel_document::DieselDocumentRepository;
pub use diesel_event::DieselEventRepository;
pub use diesel_file::DieselFileRepository;
pub use diesel_pool::{AsyncSqlitePool, DieselError};
pub use diesel_user::DieselUserRepository;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a datetime for storage.
///
/// Fixed-width UTC with microseconds, so string comparison in SQL orders
/// the same way as time does.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional JSON column, falling back to `default` when absent or malformed.
pub fn parse_json_opt(s: Option<&str>, default: serde_json::Value) -> serde_json::Value {
    s.and_then(|s| serde_json::from_str(s).ok()).unwrap_or(default)
}
