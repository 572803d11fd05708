/// In-memory storage for development and testing
///
/// Each map sits behind a `tokio::sync::RwLock`, which gives the
/// read-after-write consistency the refresh flow relies on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenRepository, UserRecord, UserRepository};
use crate::error::DatabaseError;

/// In-memory user accounts
#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// In-memory refresh token table keyed by token
#[derive(Default, Clone)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens, revoked or not
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&record.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Refresh token already exists".to_string(),
            ));
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn set_revoked(&self, token: &str, when: DateTime<Utc>) -> Result<bool, DatabaseError> {
        match self.tokens.write().await.get_mut(token) {
            Some(record) => {
                record.revoked_at = Some(when);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
