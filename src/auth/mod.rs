/// Authentication module
///
/// Handles password hashing, access token signing/verification, refresh
/// token management, credential extraction and the session flows built on them.

mod claims;
mod extract;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use claims::{Claims, ISSUER};
pub use extract::{get_api_key, get_bearer_token, API_KEY_HEADER};
pub use jwt::{
    clamp_access_ttl, issue_access_token, issue_access_token_at, verify_access_token,
    verify_access_token_at, MAX_ACCESS_TOKEN_TTL_SECONDS,
};
pub use password::{hash_password, hash_password_with_cost, verify_password};
pub use refresh_token::{generate_refresh_token, RefreshTokenStore, REFRESH_TOKEN_LIFETIME_HOURS};
pub use session::{authenticate, Session, SessionManager};
