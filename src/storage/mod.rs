/// Storage collaborators consumed by the auth core
///
/// The auth core only talks to these traits. Postgres backs them in
/// production; the in-memory versions back tests and local runs.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;

mod memory;
mod postgres;

pub use memory::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
pub use postgres::{PgRefreshTokenRepository, PgUserRepository};

/// A user account as seen by the auth core
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted refresh token row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    /// 64 lowercase hex characters, unique
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of a refresh token at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Expired,
    Revoked,
}

impl RefreshTokenRecord {
    /// Expiry is checked before revocation, so an expired token reports
    /// `Expired` even if it was also revoked.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if now > self.expires_at {
            TokenState::Expired
        } else if self.revoked_at.is_some() {
            TokenState::Revoked
        } else {
            TokenState::Active
        }
    }
}

/// User lookup collaborator
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError>;

    /// Fails with `UniqueConstraintViolation` if the email is taken
    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<UserRecord, DatabaseError>;

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError>;
}

/// Refresh token storage collaborator
///
/// Implementations must give read-after-write consistency on the same token.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError>;

    /// Sets `revoked_at = when`. Returns false if no row matched.
    async fn set_revoked(&self, token: &str, when: DateTime<Utc>) -> Result<bool, DatabaseError>;
}

/// Bound a single storage call by `limit`
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    tokio::time::timeout(limit, call).await?
}
