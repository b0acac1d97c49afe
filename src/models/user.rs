//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Role assigned to accounts created without an explicit one.
pub const DEFAULT_ROLE: &str = "user";

/// A registered user.
///
/// The password hash never leaves the process: it is skipped when the
/// struct is serialized.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash,
            role: DEFAULT_ROLE.to_string(),
            is_active: true,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

impl User {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
