/// Session Manager
///
/// Orchestrates the hasher, token codec, refresh token store and credential
/// extractor into login, refresh, revoke and per-request authentication.
///
/// Refresh token states: `Active` -> `Expired` | `Revoked`. A refresh revokes
/// the presented token before minting the access token, so one refresh token
/// mints at most one access token. Refresh does not issue a replacement
/// refresh token; the client logs in again once it is consumed.
///
/// There is no compare-and-swap on revocation: two refreshes racing between
/// their lookups can both succeed. Storage that needs a stronger guarantee
/// must make `set_revoked` conditional.

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::extract::get_bearer_token;
use crate::auth::jwt::{clamp_access_ttl, issue_access_token, verify_access_token};
use crate::auth::password::{hash_password_with_cost, verify_password};
use crate::auth::refresh_token::RefreshTokenStore;
use crate::configuration::AuthSettings;
use crate::error::{AuthError, Rejection};
use crate::storage::{with_timeout, RefreshTokenRepository, TokenState, UserRepository};

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    tokens: RefreshTokenStore,
    settings: AuthSettings,
    /// Verified against when the email is unknown, so both failure paths cost a bcrypt check
    decoy_hash: String,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        settings: AuthSettings,
    ) -> Self {
        let decoy_hash = match hash_password_with_cost("decoy-password", settings.password_cost) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    cost = settings.password_cost,
                    "Decoy hash unavailable, unknown-email logins will answer faster"
                );
                String::new()
            }
        };

        Self {
            users,
            tokens: RefreshTokenStore::new(refresh_tokens, settings.store_timeout()),
            settings,
            decoy_hash,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Log in with a one hour access token
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.login_with_ttl(email, password, None).await
    }

    /// Log in, honouring a requested access token lifetime up to one hour
    ///
    /// # Errors
    /// - `Unauthenticated(InvalidCredentials)` for an unknown email or wrong password alike
    /// - `Internal` if hashing, signing or storage fails
    pub async fn login_with_ttl(
        &self,
        email: &str,
        password: &str,
        requested_ttl_seconds: Option<i64>,
    ) -> Result<Session, AuthError> {
        // Stored emails are trimmed at registration
        let email = email.trim();
        let user = with_timeout(self.settings.store_timeout(), self.users.find_by_email(email)).await?;

        let user = match user {
            Some(user) => user,
            None => {
                // Outcome ignored: this only equalises response time
                let _ = verify_password(password, &self.decoy_hash);
                tracing::warn!("Login rejected: no account for email");
                return Err(AuthError::Unauthenticated(Rejection::InvalidCredentials));
            }
        };

        if let Err(e) = verify_password(password, &user.hashed_password) {
            tracing::warn!(user_id = %user.id, reason = %e, "Login rejected");
            return Err(e.into());
        }

        let access_token = issue_access_token(
            user.id,
            &self.settings.jwt_secret,
            clamp_access_ttl(requested_ttl_seconds),
        )?;
        let refresh = self.tokens.create(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(Session {
            user_id: user.id,
            email: user.email,
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Exchange the bearer refresh token for a new one hour access token
    ///
    /// The presented token is revoked before the access token is issued. If
    /// the revoke write fails, no access token is returned.
    ///
    /// # Errors
    /// Always `Unauthenticated` (or `Malformed` for a bad header); internal
    /// failures are logged and folded into `Unauthenticated(Unavailable)`.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        self.consume_refresh_token(headers)
            .await
            .map_err(AuthError::into_unauthenticated)
    }

    async fn consume_refresh_token(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let presented = get_bearer_token(headers)?;
        let record = self.tokens.lookup(&presented).await?;

        match record.state_at(Utc::now()) {
            TokenState::Active => {}
            TokenState::Expired => {
                tracing::info!(user_id = %record.user_id, "Refresh with expired token");
                return Err(AuthError::Unauthenticated(Rejection::RefreshTokenExpired));
            }
            TokenState::Revoked => {
                tracing::warn!(user_id = %record.user_id, "Refresh with revoked token");
                return Err(AuthError::Unauthenticated(Rejection::RefreshTokenRevoked));
            }
        }

        // Durable revoke first: a replay of this token must see it revoked
        self.tokens.revoke(&record.token).await?;

        let access_token = issue_access_token(
            record.user_id,
            &self.settings.jwt_secret,
            clamp_access_ttl(None),
        )?;

        tracing::info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the bearer refresh token
    ///
    /// Revoking an already revoked token succeeds and rewrites the timestamp.
    ///
    /// # Errors
    /// `Unauthenticated` if the token is unknown or expired
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        self.revoke_refresh_token(headers)
            .await
            .map_err(AuthError::into_unauthenticated)
    }

    async fn revoke_refresh_token(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let presented = get_bearer_token(headers)?;
        let record = self.tokens.lookup(&presented).await?;

        if record.state_at(Utc::now()) == TokenState::Expired {
            return Err(AuthError::Unauthenticated(Rejection::RefreshTokenExpired));
        }

        self.tokens.revoke(&record.token).await?;

        tracing::info!(user_id = %record.user_id, "Refresh token revoked");
        Ok(())
    }

    /// Identify the caller of a protected endpoint
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        authenticate(headers, &self.settings.jwt_secret)
    }
}

/// Extract the bearer access token and verify it against `secret`
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<Uuid, AuthError> {
    let token = get_bearer_token(headers)?;
    let user_id = verify_access_token(&token, secret)?;
    Ok(user_id)
}
