//! Stripe webhook handling
//!
//! Verifies the delivery signature, parses the envelope and hands the event to the
//! reconciler. Nothing is parsed or written before the signature checks out.

use time::OffsetDateTime;

use crate::error::{BillingError, BillingResult};
use crate::events::WebhookEvent;
use crate::reconciler::{ReconcileOutcome, SubscriptionReconciler};
use crate::signature::{verify_signature, DEFAULT_TOLERANCE_SECS};

/// Webhook handler for Stripe events
pub struct WebhookHandler {
    webhook_secret: String,
    tolerance_secs: i64,
    reconciler: SubscriptionReconciler,
}

impl WebhookHandler {
    pub fn new(webhook_secret: impl Into<String>, reconciler: SubscriptionReconciler) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            reconciler,
        }
    }

    /// Verify and parse a Stripe webhook delivery
    pub fn verify_event(&self, payload: &[u8], signature: &str) -> BillingResult<WebhookEvent> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        verify_signature(
            payload,
            signature,
            &self.webhook_secret,
            self.tolerance_secs,
            now,
        )?;

        let event = WebhookEvent::parse(payload).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse webhook event JSON");
            e
        })?;

        tracing::debug!(
            event_type = %event.event_type,
            event_id = %event.id,
            "Webhook signature verified"
        );
        Ok(event)
    }

    /// Handle a verified Stripe event
    pub async fn handle_event(&self, event: &WebhookEvent) -> BillingResult<ReconcileOutcome> {
        tracing::info!(
            event_type = %event.event_type,
            event_id = %event.id,
            created = event.created,
            "Processing Stripe webhook event"
        );

        match self.reconciler.reconcile(event).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    error = %e,
                    "Webhook handler failed, Stripe will retry"
                );
                Err(e)
            }
        }
    }

    /// Verify, parse and reconcile one delivery
    pub async fn process(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> BillingResult<ReconcileOutcome> {
        let signature = signature.ok_or_else(|| {
            tracing::warn!("Webhook delivery without Stripe-Signature header");
            BillingError::WebhookSignatureInvalid
        })?;
        let event = self.verify_event(payload, signature)?;
        self.handle_event(&event).await
    }
}
