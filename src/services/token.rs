//! Token renewal use case.

use super::auth::TokenPair;
use crate::auth::JwtService;

/// Minutes granted by a renewal unless configured otherwise.
pub const DEFAULT_RENEWAL_MINUTES: i64 = 15;

#[derive(Debug, Clone)]
pub struct TokenService {
    jwt: JwtService,
    renewal_minutes: i64,
}

impl TokenService {
    pub fn new(jwt: JwtService, renewal_minutes: i64) -> Self {
        Self {
            jwt,
            renewal_minutes,
        }
    }

    /// Issue a fresh token carrying the same claims as `token`, valid for the
    /// configured renewal window. `None` when `token` is invalid or expired.
    pub fn renew_token(&self, token: &str) -> Option<TokenPair> {
        self.renew_token_for(token, self.renewal_minutes)
    }

    pub fn renew_token_for(&self, token: &str, additional_minutes: i64) -> Option<TokenPair> {
        if !self.jwt.verify_token(token) {
            return None;
        }
        self.jwt
            .renew_token(token, additional_minutes)
            .map(TokenPair::bearer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use chrono::{Duration, Utc};

    fn claims() -> Claims {
        Claims {
            sub: "ana".to_string(),
            id_usuario: 7,
            rol: "user".to_string(),
            exp: 0,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_renew_extends_expiry_and_keeps_claims() {
        let jwt = JwtService::new("secret", "HS256", 1).unwrap();
        let service = TokenService::new(jwt.clone(), DEFAULT_RENEWAL_MINUTES);
        let token = jwt.create_token(claims(), None).unwrap();

        let renewed = service.renew_token(&token).unwrap();
        assert_eq!(renewed.token_type, "bearer");

        let decoded = jwt.decode_token(&renewed.access_token).unwrap();
        assert_eq!(decoded.id_usuario, 7);
        assert_eq!(decoded.rol, "user");
        let expected = (Utc::now() + Duration::minutes(15)).timestamp();
        assert!((decoded.exp - expected).abs() <= 5);
    }

    #[test]
    fn test_expired_or_garbage_tokens_are_not_renewed() {
        let jwt = JwtService::new("secret", "HS256", 15).unwrap();
        let service = TokenService::new(jwt.clone(), DEFAULT_RENEWAL_MINUTES);
        let expired = jwt
            .create_token(claims(), Some(Duration::minutes(-5)))
            .unwrap();

        assert!(service.renew_token(&expired).is_none());
        assert!(service.renew_token("not.a.token").is_none());

        let other = JwtService::new("other-secret", "HS256", 15).unwrap();
        let foreign = other.create_token(claims(), None).unwrap();
        assert!(service.renew_token(&foreign).is_none());
    }
}
