//! Checkout session endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::ORIGIN, HeaderMap},
    Extension, Json,
};
use greenzone_shared::PlanType;
use serde::{Deserialize, Serialize};

use crate::{
    auth::SessionUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    pub plan_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Start a VIP purchase for the signed-in user
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    headers: HeaderMap,
    payload: Result<Json<CreateCheckoutRequest>, JsonRejection>,
) -> ApiResult<Json<CreateCheckoutResponse>> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Invalid checkout request body");
        ApiError::Validation("Invalid request body".to_string())
    })?;

    let plan = request
        .plan_type
        .as_deref()
        .and_then(PlanType::from_checkout_code)
        .ok_or_else(|| ApiError::Validation("Invalid plan type".to_string()))?;

    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(state.config.app_url.as_str());

    let session = state
        .billing
        .checkout
        .create_session(user.id, &user.email, plan, origin)
        .await?;

    Ok(Json(CreateCheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}
