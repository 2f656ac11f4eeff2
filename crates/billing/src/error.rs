//! Billing error types

use greenzone_shared::StoreError;
use thiserror::Error;

pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Webhook signature verification failed")]
    WebhookSignatureInvalid,

    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),

    #[error("Stripe API error: {0}")]
    StripeApi(String),

    #[error("Profile store error: {0}")]
    Store(#[from] StoreError),

    #[error("Billing configuration error: {0}")]
    Config(String),
}

impl BillingError {
    /// Protocol errors are terminal: re-delivering the same payload cannot succeed,
    /// so the provider must not retry them.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            BillingError::WebhookSignatureInvalid | BillingError::MalformedEvent(_)
        )
    }
}

impl From<stripe::StripeError> for BillingError {
    fn from(e: stripe::StripeError) -> Self {
        BillingError::StripeApi(e.to_string())
    }
}
