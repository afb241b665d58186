//! Host platform events delivered to the bridge.
//!
//! Every body is signed with the host secret, see
//! [`SignedObject`](crate::signature::SignedObject).

use serde::{Deserialize, Serialize};

use crate::signature::Signature;

/// A fulfillment was created or canceled on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FulfillmentEvent {
    #[serde(rename = "fulfillmentId")]
    pub fulfillment_id: i64,
}

impl Signature for FulfillmentEvent {}

/// An order was updated on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderEvent {
    #[serde(rename = "orderId")]
    pub order_id: i64,
}

impl Signature for OrderEvent {}

/// Reply to a host event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAck {
    /// `false` when the plugin is inactive or the event needed no action.
    pub handled: bool,
    #[serde(rename = "otoId", default, skip_serializing_if = "Option::is_none")]
    pub oto_id: Option<String>,
}
