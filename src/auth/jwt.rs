//! JWT issuance, verification and renewal.
//!
//! Tokens are signed with a shared secret (HS256/384/512). Claim names
//! `id_usuario` and `rol` are part of the wire format expected by existing
//! clients.

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AuthError;
use crate::models::User;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    /// User ID.
    pub id_usuario: i32,
    /// Role name.
    pub rol: String,
    /// Expiry as a Unix timestamp.
    #[serde(default)]
    pub exp: i64,
    /// Any other claims present in a token are carried through renewal.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    pub fn for_user(user: &User) -> Self {
        Self {
            sub: user.username.clone(),
            id_usuario: user.id,
            rol: user.role.clone(),
            exp: 0,
            extra: serde_json::Map::new(),
        }
    }
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expiration: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("algorithm", &self.algorithm)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str, algorithm: &str, expiration_minutes: i64) -> Result<Self, AuthError> {
        let algorithm = parse_algorithm(algorithm)?;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            expiration: Duration::minutes(expiration_minutes),
        })
    }

    /// Sign `claims`, setting `exp` to now plus `expires_in` (or the configured lifetime).
    pub fn create_token(
        &self,
        mut claims: Claims,
        expires_in: Option<Duration>,
    ) -> Result<String, AuthError> {
        let lifetime = expires_in.unwrap_or(self.expiration);
        claims.exp = (Utc::now() + lifetime).timestamp();
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// Verify signature and expiry; `None` for any invalid token.
    pub fn decode_token(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected token: {}", e);
                None
            }
        }
    }

    pub fn verify_token(&self, token: &str) -> bool {
        self.decode_token(token).is_some()
    }

    /// Re-sign a still-valid token's claims with a fresh expiry.
    pub fn renew_token(&self, token: &str, additional_minutes: i64) -> Option<String> {
        let claims = self.decode_token(token)?;
        match self.create_token(claims, Some(Duration::minutes(additional_minutes))) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Failed to re-sign token: {}", e);
                None
            }
        }
    }
}

fn parse_algorithm(name: &str) -> Result<Algorithm, AuthError> {
    match Algorithm::from_str(&name.to_ascii_uppercase()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(AuthError::UnsupportedAlgorithm(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test-secret", "HS256", 15).unwrap()
    }

    fn claims() -> Claims {
        Claims {
            sub: "demo_user".to_string(),
            id_usuario: 7,
            rol: "uploader".to_string(),
            exp: 0,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_create_and_decode() {
        let jwt = service();
        let token = jwt.create_token(claims(), None).unwrap();
        let decoded = jwt.decode_token(&token).unwrap();

        assert_eq!(decoded.sub, "demo_user");
        assert_eq!(decoded.id_usuario, 7);
        assert_eq!(decoded.rol, "uploader");
        let remaining = decoded.exp - Utc::now().timestamp();
        assert!(remaining > 14 * 60 && remaining <= 15 * 60);
        assert!(jwt.verify_token(&token));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = service();
        let token = jwt
            .create_token(claims(), Some(Duration::seconds(-5)))
            .unwrap();
        assert!(jwt.decode_token(&token).is_none());
        assert!(jwt.renew_token(&token, 15).is_none());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().create_token(claims(), None).unwrap();
        let other = JwtService::new("other-secret", "HS256", 15).unwrap();
        assert!(!other.verify_token(&token));
        assert!(!other.verify_token("not.a.token"));
    }

    #[test]
    fn test_renew_extends_expiry_and_keeps_claims() {
        let jwt = service();
        let mut original = claims();
        original
            .extra
            .insert("tenant".to_string(), serde_json::json!("acme"));
        let token = jwt
            .create_token(original, Some(Duration::minutes(1)))
            .unwrap();

        let renewed = jwt.renew_token(&token, 30).unwrap();
        let decoded = jwt.decode_token(&renewed).unwrap();
        assert_eq!(decoded.sub, "demo_user");
        assert_eq!(decoded.extra["tenant"], "acme");
        assert!(decoded.exp - Utc::now().timestamp() > 29 * 60);
    }

    #[test]
    fn test_unsupported_algorithm() {
        assert!(matches!(
            JwtService::new("s", "RS256", 15),
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
        assert!(JwtService::new("s", "hs512", 15).is_ok());
    }
}
