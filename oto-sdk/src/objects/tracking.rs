//! Tracking callback sent by OTO when a shipment changes state.

use serde::{Deserialize, Serialize};

use super::{optional_text_or_number, text_or_number};

/// Status OTO reports when the shipment was canceled on their side.
pub const STATUS_CANCELED: &str = "canceled";

/// Body of an OTO tracking webhook.
///
/// `orderId`, `status` and `timestamp` are required because they form the
/// signed message; every carrier field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUpdate {
    pub order_id: String,
    pub status: String,
    #[serde(deserialize_with = "text_or_number")]
    pub timestamp: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub tracking_number: Option<String>,
    #[serde(default, rename = "printAWBURL")]
    pub print_awb_url: Option<String>,
    #[serde(default, rename = "trackingURL")]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub feedback_link: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub dc_status: Option<String>,
    #[serde(default)]
    pub delivery_company: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub delivery_slot_date: Option<String>,
}

impl TrackingUpdate {
    /// Whether the provider canceled the shipment.
    pub fn is_canceled(&self) -> bool {
        self.status == STATUS_CANCELED
    }
}
