/// Postgres-backed storage collaborators

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenRepository, UserRecord, UserRepository};
use crate::error::DatabaseError;

type UserRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);
type TokenRow = (String, Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>);

fn user_from_row(row: UserRow) -> UserRecord {
    let (id, email, hashed_password, created_at, updated_at) = row;
    UserRecord {
        id,
        email,
        hashed_password,
        created_at,
        updated_at,
    }
}

fn token_from_row(row: TokenRow) -> RefreshTokenRecord {
    let (token, user_id, created_at, expires_at, revoked_at) = row;
    RefreshTokenRecord {
        token,
        user_id,
        created_at,
        expires_at,
        revoked_at,
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn create_user(&self, email: &str, hashed_password: &str) -> Result<UserRecord, DatabaseError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, hashed_password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, email, hashed_password, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }
}

#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $3, $4, $5)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id)
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.revoked_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, DatabaseError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT token, user_id, created_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(token_from_row))
    }

    async fn set_revoked(&self, token: &str, when: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token = $2
            "#,
        )
        .bind(when)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
