//! Application state

use std::sync::Arc;

use greenzone_billing::{BillingResult, BillingService};
use greenzone_shared::{PgProfileStore, ProfileStore};
use sqlx::PgPool;

use crate::{
    auth::{JwtSessionStore, SessionStore},
    config::Config,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub billing: Arc<BillingService>,
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Wire the production services. Stripe settings are required.
    pub fn new(pool: PgPool, config: Config) -> BillingResult<Self> {
        let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(pool));

        let billing = BillingService::from_env(profiles.clone())?;
        tracing::info!("Stripe billing service initialized");

        let sessions = JwtSessionStore::new(
            &config.session_secret,
            config.session_cookie_name.clone(),
            config.session_ttl_hours,
        );
        tracing::info!(
            cookie = %config.session_cookie_name,
            "Session store initialized"
        );

        Ok(Self::from_parts(
            config,
            Arc::new(billing),
            Arc::new(sessions),
            profiles,
        ))
    }

    pub fn from_parts(
        config: Config,
        billing: Arc<BillingService>,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            config,
            billing,
            sessions,
            profiles,
        }
    }
}
