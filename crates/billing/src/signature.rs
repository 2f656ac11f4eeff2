//! Stripe webhook signature verification
//!
//! Header format: `t=<unix>,v1=<hex>[,v1=<hex>...][,v0=<hex>]`. The signed payload is
//! `"<t>.<raw body>"`, keyed with the endpoint secret exactly as configured
//! (`whsec_...`, prefix included).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{BillingError, BillingResult};

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted distance between the signed timestamp and now, in seconds
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Default)]
struct SignatureHeader<'a> {
    timestamp: Option<i64>,
    v1: Vec<&'a str>,
}

fn parse_header(header: &str) -> SignatureHeader<'_> {
    let mut parsed = SignatureHeader::default();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => parsed.timestamp = value.parse().ok(),
            "v1" => parsed.v1.push(value),
            _ => {}
        }
    }
    parsed
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`
pub fn compute_signature(payload: &[u8], timestamp: i64, secret: &str) -> BillingResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        tracing::error!("Invalid webhook secret key");
        BillingError::WebhookSignatureInvalid
    })?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// Any `v1` entry that matches accepts. Comparison is constant time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now_unix: i64,
) -> BillingResult<()> {
    let parsed = parse_header(header);

    let timestamp = parsed.timestamp.ok_or_else(|| {
        tracing::warn!("Missing timestamp in signature header");
        BillingError::WebhookSignatureInvalid
    })?;

    if parsed.v1.is_empty() {
        tracing::warn!("Missing v1 signature in signature header");
        return Err(BillingError::WebhookSignatureInvalid);
    }

    // `t` is untrusted until the HMAC matches; abs_diff cannot overflow
    let diff = now_unix.abs_diff(timestamp);
    if diff > tolerance_secs.unsigned_abs() {
        tracing::warn!(
            timestamp = timestamp,
            now = now_unix,
            diff = diff,
            "Webhook timestamp outside tolerance"
        );
        return Err(BillingError::WebhookSignatureInvalid);
    }

    let expected = compute_signature(payload, timestamp, secret)?;
    let matched = parsed
        .v1
        .iter()
        .any(|candidate| bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())));

    if !matched {
        tracing::warn!(
            candidates = parsed.v1.len(),
            "Webhook signature mismatch"
        );
        return Err(BillingError::WebhookSignatureInvalid);
    }

    Ok(())
}

/// Build a header value the way Stripe signs deliveries
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> BillingResult<String> {
    let signature = compute_signature(payload, timestamp, secret)?;
    Ok(format!("t={},v1={}", timestamp, signature))
}
