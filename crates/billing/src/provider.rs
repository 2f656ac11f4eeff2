//! Payment provider seam
//!
//! The reconciler and checkout service only see [`PaymentProvider`]. The Stripe
//! implementation maps async-stripe objects onto the small snapshot types below so
//! that handlers never depend on the full Stripe object graph.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};

/// Expansion used whenever a subscription is fetched for reconciliation
pub const EXPAND_PRICE: &[&str] = &["items.data.price"];

/// Subscription lifecycle status as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Unpaid,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Paused,
}

impl SubscriptionStatus {
    /// Only `active` grants VIP. Trialing and every delinquent state revoke it.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<stripe::SubscriptionStatus> for SubscriptionStatus {
    fn from(status: stripe::SubscriptionStatus) -> Self {
        use stripe::SubscriptionStatus as StripeSubStatus;
        match status {
            StripeSubStatus::Active => SubscriptionStatus::Active,
            StripeSubStatus::Trialing => SubscriptionStatus::Trialing,
            StripeSubStatus::PastDue => SubscriptionStatus::PastDue,
            StripeSubStatus::Unpaid => SubscriptionStatus::Unpaid,
            StripeSubStatus::Canceled => SubscriptionStatus::Canceled,
            StripeSubStatus::Incomplete => SubscriptionStatus::Incomplete,
            StripeSubStatus::IncompleteExpired => SubscriptionStatus::IncompleteExpired,
            StripeSubStatus::Paused => SubscriptionStatus::Paused,
        }
    }
}

/// Authoritative subscription state fetched from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: Option<String>,
    pub status: SubscriptionStatus,
    pub metadata: HashMap<String, String>,
    /// Price of the first subscription item
    pub price_id: Option<String>,
    /// Seconds since epoch. The pinned Stripe API version always sends both periods
    /// on the subscription; `None` is kept for newer versions that moved them onto
    /// the subscription items.
    pub current_period_start: Option<i64>,
    /// Seconds since epoch, see `current_period_start`
    pub current_period_end: Option<i64>,
}

impl SubscriptionSnapshot {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("userId").map(String::as_str)
    }
}

impl From<stripe::Subscription> for SubscriptionSnapshot {
    fn from(subscription: stripe::Subscription) -> Self {
        let customer_id = match &subscription.customer {
            stripe::Expandable::Id(id) => id.to_string(),
            stripe::Expandable::Object(customer) => customer.id.to_string(),
        };
        let price_id = subscription
            .items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.to_string());

        Self {
            id: subscription.id.to_string(),
            customer_id: Some(customer_id),
            status: subscription.status.into(),
            metadata: subscription.metadata,
            price_id,
            current_period_start: Some(subscription.current_period_start),
            current_period_end: Some(subscription.current_period_end),
        }
    }
}

/// Parameters for a subscription-mode checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub customer_email: String,
    /// Copied onto both the session and the subscription it creates
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// Outbound calls to the payment provider
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn retrieve_subscription(
        &self,
        id: &str,
        expand: &[&str],
    ) -> BillingResult<SubscriptionSnapshot>;

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> BillingResult<CreatedCheckoutSession>;
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn retrieve_subscription(
        &self,
        id: &str,
        expand: &[&str],
    ) -> BillingResult<SubscriptionSnapshot> {
        // Callers only pass ids that passed `is_subscription_id`
        let sub_id = id
            .parse::<stripe::SubscriptionId>()
            .map_err(|e| BillingError::StripeApi(format!("Invalid subscription id: {}", e)))?;

        let subscription = stripe::Subscription::retrieve(self.inner(), &sub_id, expand).await?;

        tracing::debug!(
            subscription_id = %subscription.id,
            status = ?subscription.status,
            "Fetched subscription from Stripe"
        );

        Ok(subscription.into())
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> BillingResult<CreatedCheckoutSession> {
        let mut params = stripe::CreateCheckoutSession::new();
        params.mode = Some(stripe::CheckoutSessionMode::Subscription);
        params.payment_method_types =
            Some(vec![stripe::CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.success_url = Some(&request.success_url);
        params.cancel_url = Some(&request.cancel_url);
        params.customer_email = Some(&request.customer_email);
        params.line_items = Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(request.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.metadata = Some(request.metadata.clone());
        params.subscription_data = Some(stripe::CreateCheckoutSessionSubscriptionData {
            metadata: Some(request.metadata.clone()),
            ..Default::default()
        });

        let session = stripe::CheckoutSession::create(self.inner(), params).await?;

        tracing::info!(
            session_id = %session.id,
            price_id = %request.price_id,
            "Created Stripe checkout session"
        );

        Ok(CreatedCheckoutSession {
            id: session.id.to_string(),
            url: session.url,
        })
    }
}
