//! Credential handling: password hashing and bearer tokens.

mod jwt;
mod password;

pub use jwt::{Claims, JwtService};
pub use password::PasswordHasher;

use thiserror::Error;

/// Errors from hashing or token operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
