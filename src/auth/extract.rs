/// Credential extraction from request headers
///
/// `HeaderMap` lookups are case-insensitive on the header name. The value is
/// returned raw, with no decoding.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::CredentialError;

/// Header carrying the static API key used by webhook callers
pub const API_KEY_HEADER: &str = "X-API-Key";

const BEARER_SCHEME: &str = "bearer";

/// Pull the bearer credential out of the `Authorization` header
///
/// # Errors
/// - `MissingHeader` if there is no `Authorization` header
/// - `WrongScheme` if the value does not start with `Bearer` (any case)
/// - `MalformedHeader` unless the value is exactly `<scheme> <value>`
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, CredentialError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialError::MissingHeader)?
        .to_str()
        .map_err(|_| CredentialError::MalformedHeader)?;

    let starts_with_scheme = value
        .get(..BEARER_SCHEME.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(BEARER_SCHEME));
    if !starts_with_scheme {
        return Err(CredentialError::WrongScheme);
    }

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty() => {
            Ok(token.to_string())
        }
        _ => Err(CredentialError::MalformedHeader),
    }
}

/// Pull the scheme-less API key out of the `X-API-Key` header
///
/// # Errors
/// - `MissingApiKey` if the header is absent or empty
/// - `MalformedHeader` if the value is not visible ASCII
pub fn get_api_key(headers: &HeaderMap) -> Result<String, CredentialError> {
    let value = headers
        .get(API_KEY_HEADER)
        .ok_or(CredentialError::MissingApiKey)?
        .to_str()
        .map_err(|_| CredentialError::MalformedHeader)?
        .trim();

    if value.is_empty() {
        return Err(CredentialError::MissingApiKey);
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_valid_bearer() {
        let headers = headers_with("Authorization", "Bearer abc.def.ghi");
        assert_eq!(get_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_scheme_and_header_name_are_case_insensitive() {
        let headers = headers_with("authorization", "bEaReR token123");
        assert_eq!(get_bearer_token(&headers).unwrap(), "token123");
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(get_bearer_token(&HeaderMap::new()), Err(CredentialError::MissingHeader));
    }

    #[test]
    fn test_wrong_scheme() {
        let cases = ["Token abc", "Basic dXNlcjpwYXNz", "abc", ""];
        for value in cases {
            let headers = headers_with("Authorization", value);
            assert_eq!(
                get_bearer_token(&headers),
                Err(CredentialError::WrongScheme),
                "value: {:?}",
                value
            );
        }
    }

    #[test]
    fn test_malformed_header() {
        let cases = ["Bearer", "Bearer ", "Bearer  abc", "Bearer abc def", "Bearerabc xyz"];
        for value in cases {
            let headers = headers_with("Authorization", value);
            assert_eq!(
                get_bearer_token(&headers),
                Err(CredentialError::MalformedHeader),
                "value: {:?}",
                value
            );
        }
    }

    #[test]
    fn test_api_key() {
        let headers = headers_with("x-api-key", "f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(get_api_key(&headers).unwrap(), "f271c81ff7084ee5b99a5091b42d486e");
    }

    #[test]
    fn test_missing_api_key() {
        assert_eq!(get_api_key(&HeaderMap::new()), Err(CredentialError::MissingApiKey));

        let headers = headers_with("X-API-Key", "");
        assert_eq!(get_api_key(&headers), Err(CredentialError::MissingApiKey));
    }

    #[test]
    fn test_api_key_with_non_ascii_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_bytes(b"key-\xfa").unwrap(),
        );
        assert_eq!(get_api_key(&headers), Err(CredentialError::MalformedHeader));
    }

    #[test]
    fn test_api_key_ignores_authorization() {
        let headers = headers_with("Authorization", "Bearer abc");
        assert_eq!(get_api_key(&headers), Err(CredentialError::MissingApiKey));
    }
}
