/// Session Routes
///
/// Handles login, access token refresh and refresh token revocation.
/// Refresh and revoke read the refresh token from `Authorization: Bearer <token>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::SessionManager;
use crate::error::AppError;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested access token lifetime; absent, non-positive or over an hour means one hour
    pub expires_in_seconds: Option<i64>,
}

/// Login response with access and refresh tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub id: String,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response carrying only the new access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: Unknown email or wrong password (same response for both)
/// - 500: Hashing, signing or storage failure
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let session = sessions
        .login_with_ttl(&form.email, &form.password, form.expires_in_seconds)
        .await?;

    tracing::info!(user_id = %session.user_id, "Login succeeded");

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: session.user_id.to_string(),
        email: session.email,
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// POST /api/refresh
///
/// The presented refresh token is consumed: a second refresh with it fails.
///
/// # Errors
/// - 401: Missing, malformed, unknown, expired or revoked refresh token,
///   or the token store could not be reached
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let token = sessions.refresh(req.headers()).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// # Errors
/// - 401: Missing, malformed, unknown or expired refresh token
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    sessions.revoke(req.headers()).await?;

    Ok(HttpResponse::NoContent().finish())
}
