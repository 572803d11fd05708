/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS random source, hex-encoded to 64 characters
/// - Persisted with a fixed 24 hour lifetime
/// - Revoked by setting `revoked_at`; never deleted here
///
/// Validity (expired / revoked) is judged by the session manager at use time,
/// not by this store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::RefreshTokenError;
use crate::storage::{with_timeout, RefreshTokenRecord, RefreshTokenRepository};

const TOKEN_BYTES: usize = 32;

/// Refresh tokens live for exactly this long after creation
pub const REFRESH_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Generate a new cryptographically secure refresh token
///
/// # Errors
/// Returns `EntropyUnavailable` if the OS random source fails
pub fn generate_refresh_token() -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshTokenError::EntropyUnavailable(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Issues, looks up and revokes refresh tokens through a storage collaborator
#[derive(Clone)]
pub struct RefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepository>,
    timeout: StdDuration,
}

impl RefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, timeout: StdDuration) -> Self {
        Self { repo, timeout }
    }

    /// Create and persist a fresh token for `user_id`
    ///
    /// # Errors
    /// `EntropyUnavailable` or `StoreUnavailable`
    pub async fn create(&self, user_id: Uuid) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let now = Utc::now();
        let record = RefreshTokenRecord {
            token: generate_refresh_token()?,
            user_id,
            created_at: now,
            expires_at: now + Duration::hours(REFRESH_TOKEN_LIFETIME_HOURS),
            revoked_at: None,
        };

        with_timeout(self.timeout, self.repo.insert(&record)).await?;

        tracing::debug!(user_id = %user_id, "Refresh token stored");
        Ok(record)
    }

    /// Fetch the record for an exact token match
    pub async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, RefreshTokenError> {
        with_timeout(self.timeout, self.repo.find_by_token(token))
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Set the token's revocation time to now
    ///
    /// Revoking an already revoked token simply rewrites the timestamp.
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        let revoked = with_timeout(self.timeout, self.repo.set_revoked(token, Utc::now())).await?;
        if revoked {
            Ok(())
        } else {
            Err(RefreshTokenError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryRefreshTokenRepository, TokenState};

    fn store() -> RefreshTokenStore {
        RefreshTokenStore::new(
            Arc::new(InMemoryRefreshTokenRepository::new()),
            StdDuration::from_secs(1),
        )
    }

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token().unwrap();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let token1 = generate_refresh_token().unwrap();
        let token2 = generate_refresh_token().unwrap();

        assert_ne!(token1, token2);
    }

    #[tokio::test]
    async fn test_create_sets_24h_expiry() {
        let store = store();
        let user_id = Uuid::new_v4();
        let record = store.create(user_id).await.unwrap();

        assert_eq!(record.user_id, user_id);
        assert_eq!(record.expires_at - record.created_at, Duration::hours(24));
        assert!(record.revoked_at.is_none());
        assert_eq!(record.state_at(Utc::now()), TokenState::Active);
    }

    #[tokio::test]
    async fn test_lookup_and_revoke() {
        let store = store();
        let record = store.create(Uuid::new_v4()).await.unwrap();

        let found = store.lookup(&record.token).await.unwrap();
        assert_eq!(found, record);

        store.revoke(&record.token).await.unwrap();
        let revoked = store.lookup(&record.token).await.unwrap();
        assert!(revoked.revoked_at.is_some());
        assert_eq!(revoked.state_at(Utc::now()), TokenState::Revoked);
    }

    #[tokio::test]
    async fn test_revoke_twice_keeps_revoked() {
        let store = store();
        let record = store.create(Uuid::new_v4()).await.unwrap();

        store.revoke(&record.token).await.unwrap();
        store.revoke(&record.token).await.unwrap();

        let stored = store.lookup(&record.token).await.unwrap();
        assert!(stored.revoked_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let store = store();

        assert!(matches!(store.lookup("nope").await, Err(RefreshTokenError::NotFound)));
        assert!(matches!(store.revoke("nope").await, Err(RefreshTokenError::NotFound)));
    }
}
