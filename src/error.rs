/// Error Handling Module
///
/// Unified error handling for the service:
/// 1. Component errors (hasher, token codec, refresh store, credential extractor, storage)
/// 2. The session boundary error (`AuthError`), which every component error folds into
/// 3. The application error (`AppError`) and its HTTP mapping
/// 4. Structured error logging under the same id the response carries
///
/// Nothing below the session boundary leaks raw storage or cryptographic text
/// to the caller; the richer distinction is kept for logs only.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. COMPONENT ERROR TYPES
/// ============================================================================

/// Validation errors for request input
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Storage collaborator errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
    Timeout,
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::Timeout => write!(f, "Database call timed out"),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // 23505: unique_violation
                if db_err.code().as_deref() == Some("23505") {
                    DatabaseError::UniqueConstraintViolation("Email already registered".to_string())
                } else {
                    DatabaseError::QueryExecution(db_err.to_string())
                }
            }
            other => DatabaseError::UnexpectedError(other.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for DatabaseError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        DatabaseError::Timeout
    }
}

/// Credential hasher outcomes other than success
#[derive(Debug)]
pub enum PasswordError {
    /// Hashing itself failed (randomness or allocation)
    Hash(String),
    /// The password does not match the stored hash
    Mismatch,
    /// The stored hash is not a valid bcrypt string
    MalformedHash,
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::Hash(msg) => write!(f, "Password hashing failed: {}", msg),
            PasswordError::Mismatch => write!(f, "Password does not match"),
            PasswordError::MalformedHash => write!(f, "Stored password hash is malformed"),
        }
    }
}

impl StdError for PasswordError {}

/// Access token codec errors
#[derive(Debug)]
pub enum TokenError {
    InvalidSignature,
    Malformed,
    /// Outside the [nbf, exp] window
    Expired,
    Signing(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "Token signature is invalid"),
            TokenError::Malformed => write!(f, "Token is malformed"),
            TokenError::Expired => write!(f, "Token is outside its validity window"),
            TokenError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Refresh token store errors
#[derive(Debug)]
pub enum RefreshTokenError {
    EntropyUnavailable(String),
    StoreUnavailable(String),
    NotFound,
}

impl fmt::Display for RefreshTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTokenError::EntropyUnavailable(msg) => {
                write!(f, "Random source unavailable: {}", msg)
            }
            RefreshTokenError::StoreUnavailable(msg) => {
                write!(f, "Refresh token store unavailable: {}", msg)
            }
            RefreshTokenError::NotFound => write!(f, "Refresh token not found"),
        }
    }
}

impl StdError for RefreshTokenError {}

impl From<DatabaseError> for RefreshTokenError {
    fn from(err: DatabaseError) -> Self {
        RefreshTokenError::StoreUnavailable(err.to_string())
    }
}

/// Bearer / API key extraction failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    MissingHeader,
    WrongScheme,
    MalformedHeader,
    MissingApiKey,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::MissingHeader => write!(f, "Authorization header is missing"),
            CredentialError::WrongScheme => write!(f, "Authorization scheme is not Bearer"),
            CredentialError::MalformedHeader => write!(f, "Authorization header is malformed"),
            CredentialError::MissingApiKey => write!(f, "API key header is missing"),
        }
    }
}

impl StdError for CredentialError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. SESSION BOUNDARY ERROR
/// ============================================================================

/// Why a credential was rejected. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingCredential,
    InvalidCredentials,
    InvalidSignature,
    AccessTokenExpired,
    UnknownRefreshToken,
    RefreshTokenExpired,
    RefreshTokenRevoked,
    Unavailable,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::MissingCredential => "missing credential",
            Rejection::InvalidCredentials => "invalid credentials",
            Rejection::InvalidSignature => "invalid signature",
            Rejection::AccessTokenExpired => "access token expired",
            Rejection::UnknownRefreshToken => "unknown refresh token",
            Rejection::RefreshTokenExpired => "refresh token expired",
            Rejection::RefreshTokenRevoked => "refresh token revoked",
            Rejection::Unavailable => "session backend unavailable",
        };
        f.write_str(reason)
    }
}

/// Structural defects in a presented credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformation {
    WrongScheme,
    MalformedHeader,
    MalformedToken,
}

impl fmt::Display for Malformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Malformation::WrongScheme => "wrong authorization scheme",
            Malformation::MalformedHeader => "malformed authorization header",
            Malformation::MalformedToken => "malformed token",
        };
        f.write_str(reason)
    }
}

/// Error returned by every session manager operation
#[derive(Debug)]
pub enum AuthError {
    Unauthenticated(Rejection),
    Malformed(Malformation),
    Internal(String),
}

impl AuthError {
    /// Refresh and revoke only ever report `Unauthenticated` to the caller.
    /// Internal failures are logged here and folded into `Unavailable`.
    pub fn into_unauthenticated(self) -> Self {
        match self {
            AuthError::Internal(cause) => {
                tracing::error!(error = %cause, "Token store failure during session operation");
                AuthError::Unauthenticated(Rejection::Unavailable)
            }
            other => other,
        }
    }

    /// Whether the caller sees this as a 401
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::Internal(_))
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Unauthenticated(reason) => write!(f, "Unauthenticated: {}", reason),
            AuthError::Malformed(reason) => write!(f, "Malformed credential: {}", reason),
            AuthError::Internal(msg) => write!(f, "Internal auth error: {}", msg),
        }
    }
}

impl StdError for AuthError {}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::MissingHeader | CredentialError::MissingApiKey => {
                AuthError::Unauthenticated(Rejection::MissingCredential)
            }
            CredentialError::WrongScheme => AuthError::Malformed(Malformation::WrongScheme),
            CredentialError::MalformedHeader => AuthError::Malformed(Malformation::MalformedHeader),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => AuthError::Unauthenticated(Rejection::InvalidSignature),
            TokenError::Expired => AuthError::Unauthenticated(Rejection::AccessTokenExpired),
            TokenError::Malformed => AuthError::Malformed(Malformation::MalformedToken),
            TokenError::Signing(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => AuthError::Unauthenticated(Rejection::InvalidCredentials),
            PasswordError::MalformedHash => {
                // Reported like a wrong password so the response cannot reveal the account exists
                tracing::error!("Stored password hash could not be parsed");
                AuthError::Unauthenticated(Rejection::InvalidCredentials)
            }
            PasswordError::Hash(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::NotFound => AuthError::Unauthenticated(Rejection::UnknownRefreshToken),
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// ============================================================================
/// 3. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type returned by route handlers
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Auth(err.into())
    }
}

// ============================================================================
// 4. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with logs
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),

            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_ENTRY".to_string(),
                    e.to_string(),
                ),
                DatabaseError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND".to_string(),
                    "Resource not found".to_string(),
                ),
                DatabaseError::ConnectionPool(_) | DatabaseError::Timeout => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE".to_string(),
                    "Database service temporarily unavailable".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR".to_string(),
                    "Database error occurred".to_string(),
                ),
            },

            // Every credential failure looks the same from the outside
            AppError::Auth(e) => match e {
                AuthError::Unauthenticated(Rejection::InvalidCredentials) => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED".to_string(),
                    "Incorrect email or password".to_string(),
                ),
                AuthError::Unauthenticated(_) | AuthError::Malformed(_) => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED".to_string(),
                    "Invalid or expired credentials".to_string(),
                ),
                AuthError::Internal(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR".to_string(),
                    "Internal server error".to_string(),
                ),
            },
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code,
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(request_id = request_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(request_id = request_id, error = %e, "Database error");
            }
            AppError::Auth(AuthError::Unauthenticated(reason)) => {
                tracing::warn!(request_id = request_id, reason = %reason, "Authentication rejected");
            }
            AppError::Auth(AuthError::Malformed(reason)) => {
                tracing::warn!(request_id = request_id, reason = %reason, "Malformed credential");
            }
            AppError::Auth(AuthError::Internal(msg)) => {
                tracing::error!(request_id = request_id, error = %msg, "Authentication internal error");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::ConnectionPool(_) | DatabaseError::Timeout => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) if e.is_unauthenticated() => StatusCode::UNAUTHORIZED,
            AppError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::EmptyField("email");
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn test_credential_errors_are_tagged() {
        assert!(matches!(
            AuthError::from(CredentialError::MissingHeader),
            AuthError::Unauthenticated(Rejection::MissingCredential)
        ));
        assert!(matches!(
            AuthError::from(CredentialError::WrongScheme),
            AuthError::Malformed(Malformation::WrongScheme)
        ));
        assert!(matches!(
            AuthError::from(CredentialError::MalformedHeader),
            AuthError::Malformed(Malformation::MalformedHeader)
        ));
    }

    #[test]
    fn test_password_mismatch_and_malformed_hash_look_alike() {
        let mismatch = AuthError::from(PasswordError::Mismatch);
        let malformed = AuthError::from(PasswordError::MalformedHash);
        assert!(matches!(mismatch, AuthError::Unauthenticated(Rejection::InvalidCredentials)));
        assert!(matches!(malformed, AuthError::Unauthenticated(Rejection::InvalidCredentials)));
    }

    #[test]
    fn test_store_failure_folds_into_unauthenticated() {
        let err = AuthError::from(RefreshTokenError::StoreUnavailable("down".to_string()));
        assert!(matches!(err, AuthError::Internal(_)));
        assert!(matches!(
            err.into_unauthenticated(),
            AuthError::Unauthenticated(Rejection::Unavailable)
        ));
    }

    #[test]
    fn test_auth_errors_do_not_leak_detail() {
        let errors = vec![
            AppError::Auth(AuthError::Unauthenticated(Rejection::RefreshTokenRevoked)),
            AppError::Auth(AuthError::Unauthenticated(Rejection::RefreshTokenExpired)),
            AppError::Auth(AuthError::Malformed(Malformation::MalformedToken)),
        ];

        for err in errors {
            let (status, body) = <AppError as ErrorHandler>::error_response(&err, "req-1");
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body.message, "Invalid or expired credentials");
        }
    }

    #[test]
    fn test_internal_auth_error_is_500_without_cause() {
        let err = AppError::Auth(AuthError::Internal("signing key exploded".to_string()));
        let (status, body) = <AppError as ErrorHandler>::error_response(&err, "req-2");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("signing"));
    }
}
