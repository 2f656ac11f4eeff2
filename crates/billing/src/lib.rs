// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Greenzone Billing Module
//!
//! Stripe integration for the VIP subscription.
//!
//! ## Features
//!
//! - **Checkout**: Start a subscription-mode Stripe Checkout for a VIP plan
//! - **Webhooks**: Verify Stripe signatures and dispatch subscription events
//! - **Reconciliation**: Map subscription events onto profile VIP state

pub mod checkout;
pub mod client;
pub mod error;
pub mod events;
pub mod provider;
pub mod reconciler;
pub mod signature;
pub mod validation;
pub mod webhooks;


// Checkout
pub use checkout::{CheckoutService, Plan};

// Client
pub use client::{PriceIds, StripeClient, StripeConfig};

// Error
pub use error::{BillingError, BillingResult};

// Events
pub use events::{EventPayload, WebhookEvent};

// Provider
pub use provider::{
    CheckoutSessionRequest, CreatedCheckoutSession, PaymentProvider, SubscriptionSnapshot,
    SubscriptionStatus,
};

// Reconciler
pub use reconciler::{ReconcileOutcome, SkipReason, SubscriptionReconciler};

// Webhooks
pub use webhooks::WebhookHandler;

use std::sync::Arc;

use greenzone_shared::ProfileStore;

/// Main billing service that combines all billing functionality
pub struct BillingService {
    pub checkout: CheckoutService,
    pub webhooks: WebhookHandler,
}

impl BillingService {
    /// Create a new billing service from environment variables
    pub fn from_env(profiles: Arc<dyn ProfileStore>) -> BillingResult<Self> {
        Ok(Self::new(StripeConfig::from_env()?, profiles))
    }

    /// Create a new billing service with explicit config
    pub fn new(config: StripeConfig, profiles: Arc<dyn ProfileStore>) -> Self {
        let stripe = StripeClient::new(&config);
        Self::with_provider(Arc::new(stripe), config, profiles)
    }

    /// Wire the services around any payment provider
    pub fn with_provider(
        provider: Arc<dyn PaymentProvider>,
        config: StripeConfig,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let reconciler = SubscriptionReconciler::new(
            provider.clone(),
            profiles,
            config.price_ids.clone(),
        );

        Self {
            checkout: CheckoutService::new(provider, config.price_ids),
            webhooks: WebhookHandler::new(config.webhook_secret, reconciler),
        }
    }
}
