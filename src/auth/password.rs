/// Password Hashing and Verification
///
/// One-way, salted password hashing with bcrypt. Every call to
/// `hash_password` draws a fresh salt, so hashing the same password twice
/// gives two different strings that both verify.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::PasswordError;

/// Hash a password using bcrypt at the default cost
///
/// # Errors
/// Returns `PasswordError::Hash` only if bcrypt itself fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

/// Hash a password using bcrypt at an explicit cost (4..=31)
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, PasswordError> {
    hash(password, cost).map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a password against its stored hash
///
/// The comparison inside bcrypt is constant-time.
///
/// # Errors
/// - `PasswordError::Mismatch` if the password is wrong
/// - `PasswordError::MalformedHash` if `hash` is not a bcrypt string
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    match verify(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(PasswordError::Mismatch),
        Err(e) => {
            tracing::debug!(error = %e, "Stored hash rejected by bcrypt");
            Err(PasswordError::MalformedHash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::MIN_PASSWORD_COST as MIN_COST;

    #[test]
    fn test_hash_password() {
        let password = "pw123";
        let hash = hash_password_with_cost(password, MIN_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        // bcrypt identifier
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password_with_cost("pw123", MIN_COST).expect("Failed to hash password");
        assert!(verify_password("pw123", &hash).is_ok());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password_with_cost("pw123", MIN_COST).expect("Failed to hash password");
        let result = verify_password("pw124", &hash);
        assert!(matches!(result, Err(PasswordError::Mismatch)));
    }

    #[test]
    fn test_same_password_different_salts() {
        let hash1 = hash_password_with_cost("pw123", MIN_COST).unwrap();
        let hash2 = hash_password_with_cost("pw123", MIN_COST).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("pw123", &hash1).is_ok());
        assert!(verify_password("pw123", &hash2).is_ok());
    }

    #[test]
    fn test_malformed_hash() {
        let result = verify_password("pw123", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(PasswordError::MalformedHash)));
    }

    #[test]
    fn test_empty_hash_is_malformed() {
        let result = verify_password("pw123", "");
        assert!(matches!(result, Err(PasswordError::MalformedHash)));
    }
}
