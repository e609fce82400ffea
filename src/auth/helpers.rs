use chrono::Utc;

use super::{TokenGenerator, parse_token};
use crate::store::Store;
use crate::types::Token;

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    InternalError,
}

/// Basic credentials carry the token as the password of the `x-token` user,
/// for clients that can only send a username and password.
fn basic_auth_token(encoded: &str) -> Option<String> {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    match credentials.split_once(':') {
        Some(("x-token", token)) if !token.is_empty() => Some(token.to_string()),
        _ => None,
    }
}

/// Resolves a raw token to its stored record, rejecting unknown, mismatched
/// and expired tokens. Successful use refreshes `last_used_at`.
pub fn validate_token(store: &dyn Store, raw_token: &str) -> Result<Token, TokenValidationError> {
    use TokenValidationError::{InternalError, InvalidToken, TokenExpired};

    let (lookup, _) = parse_token(raw_token).map_err(|_| InvalidToken)?;
    let token = store
        .get_token_by_lookup(&lookup)
        .map_err(|_| InternalError)?
        .ok_or(InvalidToken)?;

    let matches = TokenGenerator::new()
        .verify(raw_token, &token.token_hash)
        .map_err(|_| InternalError)?;
    if !matches {
        return Err(InvalidToken);
    }
    if token.expires_at.is_some_and(|at| at < Utc::now()) {
        return Err(TokenExpired);
    }

    if let Err(e) = store.update_token_last_used(&token.id) {
        tracing::warn!(token_id = %token.id, "failed to record token use: {e}");
    }
    Ok(token)
}

/// Reads the raw token out of an `Authorization` header value.
///
/// No header means an anonymous caller (`Ok(None)`); any scheme other than
/// Bearer or Basic is rejected.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    let (scheme, value) = header
        .split_once(' ')
        .ok_or(TokenValidationError::InvalidScheme)?;
    let token = match scheme {
        "Bearer" => value.trim().to_string(),
        "Basic" => basic_auth_token(value).ok_or(TokenValidationError::InvalidToken)?,
        _ => return Err(TokenValidationError::InvalidScheme),
    };
    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::Duration;

    fn store_with_token(is_admin: bool, expired: bool) -> (SqliteStore, String) {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let expires_at = expired.then(|| Utc::now() - Duration::hours(1));
        let (token, raw) = TokenGenerator::new().issue(is_admin, None, expires_at).unwrap();
        store.create_token(&token).unwrap();
        (store, raw)
    }

    #[test]
    fn test_extract_bearer_and_basic() {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD;

        assert_eq!(
            extract_token_from_header(Some("Bearer abc")).unwrap(),
            Some("abc".to_string())
        );

        let basic = format!("Basic {}", STANDARD.encode("x-token:abc"));
        assert_eq!(
            extract_token_from_header(Some(&basic)).unwrap(),
            Some("abc".to_string())
        );

        assert!(extract_token_from_header(None).unwrap().is_none());
        assert!(matches!(
            extract_token_from_header(Some("Digest abc")),
            Err(TokenValidationError::InvalidScheme)
        ));
        assert!(matches!(
            extract_token_from_header(Some("Bearer")),
            Err(TokenValidationError::InvalidScheme)
        ));

        let wrong_user = format!("Basic {}", STANDARD.encode("admin:abc"));
        assert!(matches!(
            extract_token_from_header(Some(&wrong_user)),
            Err(TokenValidationError::InvalidToken)
        ));
    }

    #[test]
    fn test_validate_token_accepts_issued_token() {
        let (store, raw) = store_with_token(true, false);
        let token = validate_token(&store, &raw).unwrap();
        assert!(token.is_admin);

        let refreshed = store.get_token_by_id(&token.id).unwrap().unwrap();
        assert!(refreshed.last_used_at.is_some());
    }

    #[test]
    fn test_validate_token_rejects_expired() {
        let (store, raw) = store_with_token(true, true);
        assert!(matches!(
            validate_token(&store, &raw),
            Err(TokenValidationError::TokenExpired)
        ));
    }

    #[test]
    fn test_validate_token_rejects_unknown() {
        let (store, _) = store_with_token(true, false);
        assert!(matches!(
            validate_token(&store, "herald_12345678_123456789012345678901234"),
            Err(TokenValidationError::InvalidToken)
        ));
    }
}
