//! HTTP request handlers for the web server.

mod documents;
mod files;
mod health;
mod helpers;
mod history;
mod login;
mod tokens;
mod web;

// Re-export handlers for use by the router
pub use documents::{analyze_document, delete_document, get_document, list_documents};
pub use files::{delete_file, get_file, list_files, upload_file};
pub use health::{health, root};
pub use history::{export_events, list_events};
pub use login::login;
pub use tokens::renew_token;
pub use web::{documents_page, history_page};
