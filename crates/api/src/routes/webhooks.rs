//! Stripe webhook endpoint

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use greenzone_billing::ReconcileOutcome;
use serde_json::{json, Value};

use crate::{error::ApiResult, state::AppState};

/// Handle incoming Stripe webhook events
///
/// Takes the raw body: the signature covers the exact bytes Stripe sent. Every
/// reconciled or skipped event is acknowledged with 200; signature and envelope
/// failures are 400; provider and store failures are 500 so Stripe retries.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());

    let outcome = state.billing.webhooks.process(&body, signature).await?;

    match &outcome {
        ReconcileOutcome::Applied { user_id } => {
            tracing::debug!(user_id = %user_id, "Webhook applied")
        }
        ReconcileOutcome::Skipped(reason) => {
            tracing::debug!(reason = %reason, "Webhook acknowledged without changes")
        }
        ReconcileOutcome::PaymentFailed { user_id } => {
            tracing::debug!(user_id = %user_id, "Payment failure acknowledged")
        }
        ReconcileOutcome::Ignored { event_type } => {
            tracing::debug!(event_type = %event_type, "Webhook ignored")
        }
    }

    Ok(Json(json!({ "received": true })))
}
