//! VIP plan catalog and checkout session creation

use std::collections::HashMap;
use std::sync::Arc;

use greenzone_shared::PlanType;
use serde::Serialize;
use uuid::Uuid;

use crate::client::PriceIds;
use crate::error::BillingResult;
use crate::provider::{CheckoutSessionRequest, CreatedCheckoutSession, PaymentProvider};

/// A purchasable VIP plan as shown on the pricing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub code: &'static str,
    pub name: &'static str,
    /// Amount in cents
    pub amount: i64,
    pub currency: &'static str,
    pub interval: &'static str,
}

impl Plan {
    pub fn for_type(plan: PlanType) -> Self {
        match plan {
            PlanType::Monthly => Plan {
                code: plan.checkout_code(),
                name: "VIP Mensal",
                amount: 3000,
                currency: "brl",
                interval: "month",
            },
            PlanType::Annual => Plan {
                code: plan.checkout_code(),
                name: "VIP Anual",
                amount: 30000,
                currency: "brl",
                interval: "year",
            },
        }
    }

    pub fn catalog() -> Vec<Plan> {
        vec![
            Plan::for_type(PlanType::Monthly),
            Plan::for_type(PlanType::Annual),
        ]
    }
}

/// Success redirect; `{CHECKOUT_SESSION_ID}` is filled in by Stripe
pub fn success_url(origin: &str) -> String {
    format!(
        "{}/vip/success?session_id={{CHECKOUT_SESSION_ID}}",
        origin.trim_end_matches('/')
    )
}

pub fn cancel_url(origin: &str) -> String {
    format!("{}/vip?canceled=true", origin.trim_end_matches('/'))
}

/// Starts VIP purchases
pub struct CheckoutService {
    provider: Arc<dyn PaymentProvider>,
    prices: PriceIds,
}

impl CheckoutService {
    pub fn new(provider: Arc<dyn PaymentProvider>, prices: PriceIds) -> Self {
        Self { provider, prices }
    }

    /// Create a subscription-mode checkout for `plan`. The user id is attached to
    /// both the session and the subscription so later webhooks can find the profile.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        email: &str,
        plan: PlanType,
        origin: &str,
    ) -> BillingResult<CreatedCheckoutSession> {
        let mut metadata = HashMap::new();
        metadata.insert("userId".to_string(), user_id.to_string());

        let request = CheckoutSessionRequest {
            price_id: self.prices.price_id_for(plan).to_string(),
            customer_email: email.to_string(),
            metadata,
            success_url: success_url(origin),
            cancel_url: cancel_url(origin),
        };

        let session = self.provider.create_checkout_session(request).await?;

        tracing::info!(
            user_id = %user_id,
            plan = %plan,
            session_id = %session.id,
            "Checkout session created"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog() {
        let catalog = Plan::catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].code, "MONTHLY");
        assert_eq!(catalog[0].amount, 3000);
        assert_eq!(catalog[1].name, "VIP Anual");
        assert_eq!(catalog[1].amount, 30000);
        assert!(catalog.iter().all(|p| p.currency == "brl"));
    }

    #[test]
    fn test_redirect_urls() {
        assert_eq!(
            success_url("https://greenzone.app"),
            "https://greenzone.app/vip/success?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(
            cancel_url("http://localhost:3000/"),
            "http://localhost:3000/vip?canceled=true"
        );
    }

    #[test]
    fn test_plan_serializes_camel_case() {
        let json = serde_json::to_value(Plan::for_type(PlanType::Monthly)).unwrap();
        assert_eq!(json["interval"], "month");
        assert_eq!(json["code"], "MONTHLY");
    }
}
