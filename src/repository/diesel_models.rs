//! Diesel ORM models for database tables.
//!
//! Timestamps are RFC 3339 TEXT and JSON payloads are TEXT; conversion to
//! domain types happens in the repositories.

use diesel::prelude::*;

use crate::schema;

/// User record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// New user for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::users)]
pub struct NewUserRecord<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub is_active: bool,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Document record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRecord {
    pub id: i32,
    pub filename: String,
    pub document_type: String,
    pub file_path: String,
    pub extracted_data: Option<String>,
    pub sentiment: Option<String>,
    pub user_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New document for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::documents)]
pub struct NewDocumentRecord<'a> {
    pub filename: &'a str,
    pub document_type: &'a str,
    pub file_path: &'a str,
    pub extracted_data: Option<&'a str>,
    pub sentiment: Option<&'a str>,
    pub user_id: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// File record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FileRecord {
    pub id: i32,
    pub filename: String,
    pub s3_key: String,
    pub s3_url: Option<String>,
    pub file_size: i64,
    pub content_type: String,
    pub status: String,
    pub validations: Option<String>,
    pub user_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New file for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::files)]
pub struct NewFileRecord<'a> {
    pub filename: &'a str,
    pub s3_key: &'a str,
    pub s3_url: Option<&'a str>,
    pub file_size: i64,
    pub content_type: &'a str,
    pub status: &'a str,
    pub validations: Option<&'a str>,
    pub user_id: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Event record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRecord {
    pub id: i32,
    pub event_type: String,
    pub description: String,
    pub user_id: Option<i32>,
    pub metadata: Option<String>,
    pub created_at: String,
}

/// New event for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::events)]
pub struct NewEventRecord<'a> {
    pub event_type: &'a str,
    pub description: &'a str,
    pub user_id: Option<i32>,
    pub metadata: Option<&'a str>,
    pub created_at: &'a str,
}
