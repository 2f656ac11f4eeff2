//! Authentication module for Greenzone

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
mod edge_case_tests;
pub mod middleware;
pub mod sessions;

pub use middleware::require_session;
pub use sessions::{Claims, JwtSessionStore};

/// The signed-in user behind a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// Resolves the current user from request headers
pub trait SessionStore: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<SessionUser>;
}
