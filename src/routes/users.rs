/// User Routes
///
/// Account registration, credential updates and the current-user lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password_with_cost, SessionManager};
use crate::error::{AppError, DatabaseError};
use crate::middleware::AuthenticatedUser;
use crate::storage::{with_timeout, UserRecord, UserRepository};
use crate::validators::{is_valid_email, is_valid_password};

/// Body of both registration and credential update
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user; never includes the password hash
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or password
/// - 409: Email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;
    let hashed = hash_password_with_cost(&form.password, sessions.settings().password_cost)?;

    let user = with_timeout(
        sessions.settings().store_timeout(),
        users.create_user(&email, &hashed),
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// Requires `Authorization: Bearer <access_token>`. Replaces the caller's
/// email and password.
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 400: Invalid email or password
/// - 409: Email taken by another account
pub async fn update_user(
    req: HttpRequest,
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let user_id = sessions.authenticate(req.headers())?;

    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;
    let hashed = hash_password_with_cost(&form.password, sessions.settings().password_cost)?;

    let user = with_timeout(
        sessions.settings().store_timeout(),
        users.update_credentials(user_id, &email, &hashed),
    )
    .await?;

    tracing::info!(user_id = %user.id, "User credentials updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// GET /api/users/me
///
/// The caller's identity is injected by `JwtMiddleware`.
///
/// # Errors
/// - 401: Missing or invalid token (handled by middleware)
/// - 404: Account deleted after the token was issued
pub async fn get_current_user(
    caller: web::ReqData<AuthenticatedUser>,
    users: web::Data<dyn UserRepository>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let AuthenticatedUser(user_id) = caller.into_inner();

    let user = with_timeout(sessions.settings().store_timeout(), users.find_by_id(user_id))
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
