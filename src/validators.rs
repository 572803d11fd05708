/// Input validators for account registration and updates
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Email format validation
/// 3. Password bounds matching what bcrypt can hash

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 3;
const MAX_LOCAL_PART_LENGTH: usize = 64;
/// bcrypt only reads the first 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address and returns it trimmed
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    let local_part_len = trimmed.find('@').unwrap_or(0);
    if local_part_len > MAX_LOCAL_PART_LENGTH {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Checks a plaintext password before hashing
///
/// The password is used as given: no trimming.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        let valid_emails = vec![
            "a@x.com",
            "user@example.com",
            "john.doe+chirps@company.co.uk",
            "walt@breakingbad.com",
        ];

        for email in valid_emails {
            assert!(is_valid_email(email).is_ok(), "Should accept: {}", email);
        }
    }

    #[test]
    fn test_email_is_trimmed() {
        assert_eq!(is_valid_email("  a@x.com ").unwrap(), "a@x.com");
    }

    #[test]
    fn test_invalid_emails() {
        let invalid_emails = vec![
            ("", "empty"),
            ("plainaddress", "no @"),
            ("@example.com", "no local part"),
            ("user@", "no domain"),
            ("user@@example.com", "double @"),
        ];

        for (email, reason) in invalid_emails {
            assert!(is_valid_email(email).is_err(), "Should reject ({}): {}", reason, email);
        }
    }

    #[test]
    fn test_email_length_limits() {
        let long_local = format!("{}@x.com", "a".repeat(65));
        assert!(matches!(
            is_valid_email(&long_local),
            Err(ValidationError::InvalidFormat("email"))
        ));

        let too_long = format!("a@{}.com", "b".repeat(260));
        assert!(matches!(is_valid_email(&too_long), Err(ValidationError::TooLong("email", _))));
    }

    #[test]
    fn test_password_bounds() {
        assert!(is_valid_password("pw123").is_ok());
        assert!(is_valid_password(" leading and trailing spaces ").is_ok());
        assert!(is_valid_password(&"p".repeat(72)).is_ok());

        assert!(matches!(is_valid_password(""), Err(ValidationError::EmptyField("password"))));
        assert!(matches!(
            is_valid_password(&"p".repeat(73)),
            Err(ValidationError::TooLong("password", 72))
        ));
    }
}
