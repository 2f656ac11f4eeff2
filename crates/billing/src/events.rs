//! Webhook envelope parsing
//!
//! Only the fields the reconciler reads are modelled. Unknown fields are ignored so
//! newer Stripe API versions keep parsing.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{BillingError, BillingResult};

/// A reference that Stripe sends either as a bare id or as an expanded object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ObjectRef {
    Id(String),
    Expanded { id: String },
}

impl ObjectRef {
    pub fn id(&self) -> &str {
        match self {
            ObjectRef::Id(id) => id,
            ObjectRef::Expanded { id } => id,
        }
    }
}

fn user_id_from(metadata: &Option<HashMap<String, String>>) -> Option<&str> {
    metadata
        .as_ref()
        .and_then(|m| m.get("userId"))
        .map(String::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<ObjectRef>,
    #[serde(default)]
    pub subscription: Option<ObjectRef>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl CheckoutSessionObject {
    pub fn user_id(&self) -> Option<&str> {
        user_id_from(&self.metadata)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub subscription: Option<ObjectRef>,
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceParent {
    #[serde(default)]
    pub subscription_details: Option<InvoiceSubscriptionDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceSubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<ObjectRef>,
}

impl InvoiceObject {
    /// `invoice.subscription`, or `parent.subscription_details.subscription` on API
    /// versions that moved it
    pub fn subscription_id(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|p| p.subscription_details.as_ref())
                    .and_then(|d| d.subscription.as_ref())
            })
            .map(ObjectRef::id)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<ObjectRef>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl SubscriptionObject {
    pub fn user_id(&self) -> Option<&str> {
        user_id_from(&self.metadata)
    }
}

/// The closed set of events this service reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    CheckoutCompleted(CheckoutSessionObject),
    InvoicePaid(InvoiceObject),
    InvoicePaymentFailed(InvoiceObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    Unhandled,
}

/// A verified, parsed webhook delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    pub created: i64,
    pub payload: EventPayload,
}

#[derive(Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: i64,
    data: EnvelopeData,
}

#[derive(Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

fn object_as<T: serde::de::DeserializeOwned>(
    event_type: &str,
    object: serde_json::Value,
) -> BillingResult<T> {
    serde_json::from_value(object).map_err(|e| {
        BillingError::MalformedEvent(format!("{} object did not parse: {}", event_type, e))
    })
}

impl WebhookEvent {
    /// Parse a raw delivery body. Call only after the signature has been verified.
    pub fn parse(payload: &[u8]) -> BillingResult<Self> {
        let envelope: Envelope = serde_json::from_slice(payload)
            .map_err(|e| BillingError::MalformedEvent(format!("invalid envelope: {}", e)))?;

        let object = envelope.data.object;
        let event_type = envelope.event_type;
        let payload = match event_type.as_str() {
            "checkout.session.completed" => {
                EventPayload::CheckoutCompleted(object_as(&event_type, object)?)
            }
            "invoice.paid" | "invoice.payment_succeeded" => {
                EventPayload::InvoicePaid(object_as(&event_type, object)?)
            }
            "invoice.payment_failed" => {
                EventPayload::InvoicePaymentFailed(object_as(&event_type, object)?)
            }
            "customer.subscription.updated" => {
                EventPayload::SubscriptionUpdated(object_as(&event_type, object)?)
            }
            "customer.subscription.deleted" => {
                EventPayload::SubscriptionDeleted(object_as(&event_type, object)?)
            }
            _ => EventPayload::Unhandled,
        };

        Ok(Self {
            id: envelope.id,
            event_type,
            created: envelope.created,
            payload,
        })
    }
}
