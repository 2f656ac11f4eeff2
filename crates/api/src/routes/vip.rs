//! VIP status, plan catalog and health endpoints

use axum::{extract::State, Extension, Json};
use greenzone_billing::Plan;
use greenzone_shared::PlanType;
use serde::Serialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    auth::SessionUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VipStatusResponse {
    pub is_vip: bool,
    pub plan: Option<PlanType>,
    /// RFC 3339
    pub expires_at: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_plans() -> Json<Vec<Plan>> {
    Json(Plan::catalog())
}

/// VIP gate for the signed-in user; expiry is checked against the current time
pub async fn vip_status(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<VipStatusResponse>> {
    let profile = state
        .profiles
        .find(user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let is_vip = profile.has_active_vip(OffsetDateTime::now_utc());
    let expires_at = profile.period_end.and_then(|end| end.format(&Rfc3339).ok());

    Ok(Json(VipStatusResponse {
        is_vip,
        plan: if is_vip { profile.plan } else { None },
        expires_at,
    }))
}
