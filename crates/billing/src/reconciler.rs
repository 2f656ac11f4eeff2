//! Subscription reconciliation
//!
//! Maps each verified webhook event onto at most one profile write. Data problems in
//! an event (no user id, no subscription, bad period) are logged and reported as
//! [`ReconcileOutcome::Skipped`]; only provider and store failures are errors.

use std::sync::Arc;

use greenzone_shared::{Field, ProfileStore, ProfileUpdate};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::client::PriceIds;
use crate::error::BillingResult;
use crate::events::{
    CheckoutSessionObject, EventPayload, InvoiceObject, ObjectRef, SubscriptionObject,
    WebhookEvent,
};
use crate::provider::{PaymentProvider, SubscriptionSnapshot, EXPAND_PRICE};
use crate::validation::{is_subscription_id, parse_user_id, period_timestamp};

/// Why an event was acknowledged without writing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingUserId,
    InvalidUserId(String),
    MissingSubscription,
    InvalidPeriod { subscription_id: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingUserId => write!(f, "userId missing from metadata"),
            SkipReason::InvalidUserId(value) => write!(f, "userId '{}' is not a valid UUID", value),
            SkipReason::MissingSubscription => write!(f, "no subscription referenced"),
            SkipReason::InvalidPeriod { subscription_id } => write!(
                f,
                "subscription {} has missing or invalid period timestamps",
                subscription_id
            ),
        }
    }
}

/// Result of reconciling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A profile write was performed
    Applied { user_id: Uuid },
    /// Nothing written because the event data was unusable
    Skipped(SkipReason),
    /// Renewal charge failed; recorded in logs only
    PaymentFailed { user_id: Uuid },
    /// Event type this service does not react to
    Ignored { event_type: String },
}

fn skip(event_type: &str, reason: SkipReason) -> ReconcileOutcome {
    tracing::warn!(event_type = %event_type, reason = %reason, "Skipping webhook event");
    ReconcileOutcome::Skipped(reason)
}

/// Validate a metadata user id, or produce the matching skip reason
fn resolve_user(user_id: Option<&str>) -> Result<Uuid, SkipReason> {
    let raw = user_id.ok_or(SkipReason::MissingUserId)?;
    parse_user_id(raw).ok_or_else(|| SkipReason::InvalidUserId(raw.to_string()))
}

/// A subscription reference that can be fetched, or `MissingSubscription`
fn resolve_subscription(id: Option<&str>) -> Result<&str, SkipReason> {
    match id {
        Some(id) if is_subscription_id(id) => Ok(id),
        Some(id) => {
            tracing::warn!(subscription_ref = %id, "Unusable subscription reference");
            Err(SkipReason::MissingSubscription)
        }
        None => Err(SkipReason::MissingSubscription),
    }
}

/// Applies webhook events to profiles
pub struct SubscriptionReconciler {
    provider: Arc<dyn PaymentProvider>,
    profiles: Arc<dyn ProfileStore>,
    prices: PriceIds,
}

impl SubscriptionReconciler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        profiles: Arc<dyn ProfileStore>,
        prices: PriceIds,
    ) -> Self {
        Self {
            provider,
            profiles,
            prices,
        }
    }

    pub async fn reconcile(&self, event: &WebhookEvent) -> BillingResult<ReconcileOutcome> {
        match &event.payload {
            EventPayload::CheckoutCompleted(session) => self.checkout_completed(session).await,
            EventPayload::InvoicePaid(invoice) => self.invoice_paid(invoice).await,
            EventPayload::InvoicePaymentFailed(invoice) => {
                self.invoice_payment_failed(invoice).await
            }
            EventPayload::SubscriptionUpdated(subscription) => {
                self.subscription_updated(subscription).await
            }
            EventPayload::SubscriptionDeleted(subscription) => {
                self.subscription_deleted(subscription).await
            }
            EventPayload::Unhandled => {
                tracing::info!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    "Received unhandled Stripe event type"
                );
                Ok(ReconcileOutcome::Ignored {
                    event_type: event.event_type.clone(),
                })
            }
        }
    }

    /// Grant VIP after a completed checkout
    pub async fn checkout_completed(
        &self,
        session: &CheckoutSessionObject,
    ) -> BillingResult<ReconcileOutcome> {
        const EVENT: &str = "checkout.session.completed";

        let user_id = match resolve_user(session.user_id()) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };
        let subscription_id = match resolve_subscription(
            session.subscription.as_ref().map(ObjectRef::id),
        ) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };

        let subscription = self
            .provider
            .retrieve_subscription(subscription_id, EXPAND_PRICE)
            .await?;
        let plan = self
            .prices
            .plan_for_price_id(subscription.price_id.as_deref());

        let (Some(start), Some(end)) = (
            period_timestamp(subscription.current_period_start),
            period_timestamp(subscription.current_period_end),
        ) else {
            return Ok(skip(EVENT, invalid_period(&subscription)));
        };

        let customer_id = session
            .customer
            .as_ref()
            .map(|c| c.id().to_string())
            .or_else(|| subscription.customer_id.clone());

        let update = ProfileUpdate {
            is_vip: Some(true),
            plan: Field::Set(plan),
            period_start: Field::Set(start),
            period_end: Field::Set(end),
            payment_customer_id: customer_id.map(Field::Set).unwrap_or_default(),
            payment_subscription_id: Field::Set(subscription.id.clone()),
            ..ProfileUpdate::at(OffsetDateTime::now_utc())
        };
        self.profiles.update(user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            plan = %plan,
            "VIP subscription activated"
        );
        Ok(ReconcileOutcome::Applied { user_id })
    }

    /// Extend the VIP window after a renewal charge. The plan is left as it is.
    pub async fn invoice_paid(&self, invoice: &InvoiceObject) -> BillingResult<ReconcileOutcome> {
        const EVENT: &str = "invoice.paid";

        let subscription_id = match resolve_subscription(invoice.subscription_id()) {
            Ok(id) => id,
            Err(reason) => {
                tracing::debug!(invoice_id = %invoice.id, "Invoice is not tied to a subscription");
                return Ok(skip(EVENT, reason));
            }
        };

        let subscription = self
            .provider
            .retrieve_subscription(subscription_id, EXPAND_PRICE)
            .await?;
        let user_id = match resolve_user(subscription.user_id()) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };
        let Some(end) = period_timestamp(subscription.current_period_end) else {
            return Ok(skip(EVENT, invalid_period(&subscription)));
        };

        let update = ProfileUpdate {
            is_vip: Some(true),
            period_end: Field::Set(end),
            ..ProfileUpdate::at(OffsetDateTime::now_utc())
        };
        self.profiles.update(user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            invoice_id = %invoice.id,
            period_end = %end,
            "Payment confirmed, VIP window extended"
        );
        Ok(ReconcileOutcome::Applied { user_id })
    }

    /// Record a failed renewal. Access is revoked later by the status change event.
    pub async fn invoice_payment_failed(
        &self,
        invoice: &InvoiceObject,
    ) -> BillingResult<ReconcileOutcome> {
        const EVENT: &str = "invoice.payment_failed";

        let subscription_id = match resolve_subscription(invoice.subscription_id()) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };

        let subscription = self
            .provider
            .retrieve_subscription(subscription_id, &[])
            .await?;
        let user_id = match resolve_user(subscription.user_id()) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };

        tracing::warn!(
            user_id = %user_id,
            invoice_id = %invoice.id,
            subscription_id = %subscription.id,
            "Subscription payment failed"
        );
        Ok(ReconcileOutcome::PaymentFailed { user_id })
    }

    /// Mirror the subscription status onto the profile. Anything but `active` revokes.
    pub async fn subscription_updated(
        &self,
        object: &SubscriptionObject,
    ) -> BillingResult<ReconcileOutcome> {
        const EVENT: &str = "customer.subscription.updated";

        let subscription_id = match resolve_subscription(Some(object.id.as_str())) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };
        let subscription = self
            .provider
            .retrieve_subscription(subscription_id, EXPAND_PRICE)
            .await?;
        let user_id = match resolve_user(subscription.user_id()) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };
        let Some(end) = period_timestamp(subscription.current_period_end) else {
            return Ok(skip(EVENT, invalid_period(&subscription)));
        };

        let is_active = subscription.status.is_active();
        let plan = self
            .prices
            .plan_for_price_id(subscription.price_id.as_deref());

        let update = ProfileUpdate {
            is_vip: Some(is_active),
            plan: Field::set_or_clear(is_active.then_some(plan)),
            period_end: Field::set_or_clear(is_active.then_some(end)),
            ..ProfileUpdate::at(OffsetDateTime::now_utc())
        };
        self.profiles.update(user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            "Subscription status synced"
        );
        Ok(ReconcileOutcome::Applied { user_id })
    }

    /// Revoke VIP. Uses the event object as delivered; no fetch, no period checks.
    pub async fn subscription_deleted(
        &self,
        object: &SubscriptionObject,
    ) -> BillingResult<ReconcileOutcome> {
        const EVENT: &str = "customer.subscription.deleted";

        let user_id = match resolve_user(object.user_id()) {
            Ok(id) => id,
            Err(reason) => return Ok(skip(EVENT, reason)),
        };

        let update = ProfileUpdate {
            is_vip: Some(false),
            plan: Field::Clear,
            period_end: Field::Clear,
            ..ProfileUpdate::at(OffsetDateTime::now_utc())
        };
        self.profiles.update(user_id, &update).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %object.id,
            "VIP subscription canceled"
        );
        Ok(ReconcileOutcome::Applied { user_id })
    }
}

fn invalid_period(subscription: &SubscriptionSnapshot) -> SkipReason {
    tracing::error!(
        subscription_id = %subscription.id,
        current_period_start = ?subscription.current_period_start,
        current_period_end = ?subscription.current_period_end,
        "Invalid period timestamps on subscription"
    );
    SkipReason::InvalidPeriod {
        subscription_id: subscription.id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user() {
        assert_eq!(resolve_user(None), Err(SkipReason::MissingUserId));
        assert_eq!(
            resolve_user(Some("user-123")),
            Err(SkipReason::InvalidUserId("user-123".to_string()))
        );
        let id = Uuid::new_v4();
        assert_eq!(resolve_user(Some(&id.to_string())), Ok(id));
    }

    #[test]
    fn test_resolve_subscription() {
        assert_eq!(resolve_subscription(Some("sub_1Abc")), Ok("sub_1Abc"));
        assert_eq!(
            resolve_subscription(Some("si_notasub")),
            Err(SkipReason::MissingSubscription)
        );
        assert_eq!(resolve_subscription(None), Err(SkipReason::MissingSubscription));
    }

    #[test]
    fn test_skip_reason_messages() {
        assert_eq!(
            SkipReason::MissingSubscription.to_string(),
            "no subscription referenced"
        );
        assert!(SkipReason::InvalidPeriod {
            subscription_id: "sub_1".to_string()
        }
        .to_string()
        .contains("sub_1"));
    }
}
