//! Data models for the document analysis service.

mod document;
mod event;
mod file;
mod user;

pub use document::{Document, DocumentType, NewDocument};
pub use event::{Event, EventType};
pub use file::{FileStatus, IssueKind, NewStoredFile, StoredFile, ValidationIssue};
pub use user::{NewUser, User, DEFAULT_ROLE};
