/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by an access token. Nothing else is
/// embedded: the token asserts who the caller is and when that assertion holds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// Fixed issuer identifying this service
pub const ISSUER: &str = "chirpy";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp, whole seconds)
    pub iat: i64,
    /// Not before, equal to `iat`
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `user_id` valid from `now` for `ttl`
    pub fn new(user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = now.timestamp();
        Self {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat,
            nbf: iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenError::Malformed` if the subject is not a UUID
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)
    }

    /// Whether `now` falls inside [nbf, exp]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.nbf <= now && now <= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims::new(user_id, now, Duration::seconds(3600));

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.nbf, claims.iat);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.is_valid_at(now));
    }

    #[test]
    fn test_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Utc::now(), Duration::seconds(60));

        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(Uuid::new_v4(), Utc::now(), Duration::seconds(60));
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(claims.user_id(), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let claims = Claims::new(Uuid::new_v4(), now, Duration::seconds(10));

        assert!(!claims.is_valid_at(now - Duration::seconds(1)));
        assert!(claims.is_valid_at(now + Duration::seconds(9)));
        assert!(!claims.is_valid_at(now + Duration::seconds(11)));
    }
}
