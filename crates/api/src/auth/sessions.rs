//! Signed session tokens
//!
//! The dashboard stores an HS256 JWT in an HttpOnly cookie; API clients may send the
//! same token as `Authorization: Bearer`.

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{SessionStore, SessionUser};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

/// Extract the session token from the named cookie
fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let (name, value) = cookie.trim().split_once('=')?;
                (name == cookie_name && !value.is_empty()).then(|| value.to_string())
            })
        })
}

/// Prefers the Authorization header, falls back to the cookie
fn extract_bearer_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    extract_token_from_cookie(headers, cookie_name)
}

/// JWT-backed session store
#[derive(Clone)]
pub struct JwtSessionStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie_name: String,
    ttl: Duration,
}

impl JwtSessionStore {
    pub fn new(secret: &str, cookie_name: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            cookie_name: cookie_name.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Sign a session token for `user`
    pub fn issue(&self, user: &SessionUser) -> ApiResult<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Validate a token's signature and expiry
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256)) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                None
            }
        }
    }
}

impl SessionStore for JwtSessionStore {
    fn resolve(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let token = extract_bearer_token(headers, &self.cookie_name)?;
        let claims = self.verify(&token)?;
        Some(SessionUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
