/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs carrying only registered claims.
/// They are stateless: validity is decided by the signature and the embedded
/// timestamps, so there is no server-side revocation for them.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::TokenError;

/// Longest lifetime an access token may be issued with (one hour)
pub const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Clamp a requested access token lifetime
///
/// `None`, non-positive, and over-the-cap requests get the one hour default;
/// shorter positive requests are honoured.
pub fn clamp_access_ttl(requested_seconds: Option<i64>) -> Duration {
    let seconds = match requested_seconds {
        Some(s) if s > 0 && s < MAX_ACCESS_TOKEN_TTL_SECONDS => s,
        _ => MAX_ACCESS_TOKEN_TTL_SECONDS,
    };
    Duration::seconds(seconds)
}

/// Issue an access token for `user_id`, valid from now for `ttl`
///
/// # Errors
/// Returns `TokenError::Signing` if `ttl` is not positive or encoding fails
pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    issue_access_token_at(user_id, secret, ttl, Utc::now())
}

/// Issue an access token as if the current time were `now`
pub fn issue_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    if ttl <= Duration::zero() {
        return Err(TokenError::Signing("token lifetime must be positive".to_string()));
    }

    let claims = Claims::new(user_id, now, ttl);

    encode(
        &Header::new(SIGNING_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify an access token and return its subject
///
/// # Errors
/// - `TokenError::Malformed` if the token cannot be parsed or lacks claims
/// - `TokenError::InvalidSignature` if it was not signed with `secret` using HS256
/// - `TokenError::Expired` if now is outside [nbf, exp]
pub fn verify_access_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    verify_access_token_at(token, secret, Utc::now())
}

/// Verify an access token as if the current time were `now`
pub fn verify_access_token_at(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, TokenError> {
    // Only HS256 is accepted; a token declaring any other algorithm is rejected
    let mut validation = Validation::new(SIGNING_ALGORITHM);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "nbf", "iat", "iss", "sub"]);
    // Time is checked below against the caller's clock, with no leeway
    validation.validate_exp = false;
    validation.validate_nbf = false;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        let err = classify(e.kind());
        tracing::debug!(error = %e, outcome = %err, "Access token rejected");
        err
    })?;

    if !claims.is_valid_at(now) {
        return Err(TokenError::Expired);
    }

    claims.user_id()
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
        // Signature verified, but the claims were not minted by this service
        ErrorKind::InvalidIssuer => TokenError::Malformed,
        ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
