//! Edge Case Tests for Session Authentication
//!
//! Token lifecycle boundaries for the JWT session store:
//! - Issued tokens resolve from cookie and from Authorization header
//! - Expired, foreign-key and malformed tokens resolve to nobody

#[cfg(test)]
mod session_tests {
    use super::super::sessions::*;
    use super::super::{SessionStore, SessionUser};
    use axum::http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, HeaderValue,
    };
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    const SECRET: &str = "test-session-secret-for-testing-only";
    const COOKIE_NAME: &str = "greenzone_session";

    fn store() -> JwtSessionStore {
        JwtSessionStore::new(SECRET, COOKIE_NAME, 24)
    }

    fn user() -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: "player@example.com".to_string(),
        }
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", COOKIE_NAME, token)).unwrap(),
        );
        headers
    }

    fn signed_with(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issued_token_resolves_from_cookie() {
        let store = store();
        let user = user();
        let token = store.issue(&user).unwrap();

        assert_eq!(store.resolve(&cookie_headers(&token)), Some(user));
    }

    #[test]
    fn test_issued_token_resolves_from_bearer_header() {
        let store = store();
        let user = user();
        let token = store.issue(&user).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(store.resolve(&headers), Some(user));
    }

    #[test]
    fn test_no_credentials_resolves_to_nobody() {
        assert_eq!(store().resolve(&HeaderMap::new()), None);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default validation leeway
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "late@example.com".to_string(),
            iat: (now - Duration::hours(25)).unix_timestamp(),
            exp: (now - Duration::hours(1)).unix_timestamp(),
        };
        let token = signed_with(SECRET, &claims);

        assert_eq!(store().resolve(&cookie_headers(&token)), None);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "forged@example.com".to_string(),
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
        };
        let token = signed_with("some-other-secret", &claims);

        assert_eq!(store().resolve(&cookie_headers(&token)), None);
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert_eq!(store().resolve(&cookie_headers("not.a.jwt")), None);
    }

    #[test]
    fn test_token_lifetime_follows_ttl() {
        let store = JwtSessionStore::new(SECRET, COOKIE_NAME, 2);
        let token = store.issue(&user()).unwrap();
        let claims = store.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 2 * 3600);
    }
}
