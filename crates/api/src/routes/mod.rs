//! HTTP routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{auth::require_session, state::AppState};

pub mod checkout;
pub mod vip;
pub mod webhooks;


/// Build the API router
pub fn create_router(state: AppState) -> Router {
    // Routes that need a signed-in user
    let session_routes = Router::new()
        .route(
            "/api/create-checkout-session",
            post(checkout::create_checkout_session),
        )
        .route("/api/vip/status", get(vip::vip_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(vip::health))
        .route("/api/plans", get(vip::list_plans))
        // Stripe signs the raw body; this route must not sit behind the session layer
        .route("/api/webhooks/stripe", post(webhooks::stripe_webhook))
        .merge(session_routes)
        .with_state(state)
}
