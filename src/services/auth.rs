//! Login use case.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ServiceError;
use crate::auth::{Claims, JwtService, PasswordHasher};
use crate::repository::DieselUserRepository;

/// Token type reported alongside every issued token.
pub const TOKEN_TYPE: &str = "bearer";

/// An issued access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        }
    }
}

/// Checks credentials and issues tokens.
#[derive(Clone)]
pub struct AuthService {
    users: DieselUserRepository,
    hasher: PasswordHasher,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: DieselUserRepository, hasher: PasswordHasher, jwt: JwtService) -> Self {
        Self { users, hasher, jwt }
    }

    /// Authenticate a user. Unknown users, inactive users and wrong passwords
    /// all yield `Ok(None)`.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<TokenPair>, ServiceError> {
        let Some(user) = self.users.get_by_username(username).await? else {
            debug!("Login for unknown user '{}'", username);
            return Ok(None);
        };

        if !user.is_active {
            debug!("Login for inactive user '{}'", username);
            return Ok(None);
        }

        // bcrypt is CPU-bound
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid =
            tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash)).await?;
        if !valid {
            debug!("Wrong password for '{}'", username);
            return Ok(None);
        }

        let token = self.jwt.create_token(Claims::for_user(&user), None)?;
        Ok(Some(TokenPair::bearer(token)))
    }

    /// Hash a password off the async runtime.
    pub async fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        Ok(tokio::task::spawn_blocking(move || hasher.hash_password(&password)).await??)
    }
}
