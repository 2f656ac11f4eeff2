//! Stripe client and configuration

use greenzone_shared::PlanType;

use crate::error::{BillingError, BillingResult};

/// Configured Stripe price ids for the two VIP plans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceIds {
    pub monthly: String,
    pub annual: String,
}

impl PriceIds {
    pub fn new(monthly: impl Into<String>, annual: impl Into<String>) -> Self {
        Self {
            monthly: monthly.into(),
            annual: annual.into(),
        }
    }

    /// Price id charged for a plan at checkout
    pub fn price_id_for(&self, plan: PlanType) -> &str {
        match plan {
            PlanType::Monthly => &self.monthly,
            PlanType::Annual => &self.annual,
        }
    }

    /// Resolve the plan billed by a subscription price.
    ///
    /// Unknown or missing price ids resolve to monthly. An annual subscriber on an
    /// unconfigured price is therefore recorded as monthly; the warning below is the
    /// only trace of that.
    pub fn plan_for_price_id(&self, price_id: Option<&str>) -> PlanType {
        match price_id {
            Some(id) if id == self.monthly => PlanType::Monthly,
            Some(id) if id == self.annual => PlanType::Annual,
            other => {
                tracing::warn!(
                    price_id = ?other,
                    "Unmapped Stripe price id, falling back to monthly plan"
                );
                PlanType::Monthly
            }
        }
    }
}

/// Stripe settings read from the environment
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub price_ids: PriceIds,
}

impl StripeConfig {
    pub fn from_env() -> BillingResult<Self> {
        Ok(Self {
            secret_key: required_env("STRIPE_SECRET_KEY")?,
            webhook_secret: required_env("STRIPE_WEBHOOK_SECRET")?,
            price_ids: PriceIds::new(
                required_env("STRIPE_MONTHLY_PRICE_ID")?,
                required_env("STRIPE_ANNUAL_PRICE_ID")?,
            ),
        })
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[redacted]")
            .field("webhook_secret", &"[redacted]")
            .field("price_ids", &self.price_ids)
            .finish()
    }
}

fn required_env(name: &str) -> BillingResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BillingError::Config(format!("{} must be set", name))),
    }
}

/// Thin wrapper around the async-stripe client
#[derive(Clone)]
pub struct StripeClient {
    inner: stripe::Client,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            inner: stripe::Client::new(config.secret_key.clone()),
        }
    }

    pub fn inner(&self) -> &stripe::Client {
        &self.inner
    }
}
