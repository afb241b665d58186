pub mod events;
pub mod responses;
pub mod shipment;
pub mod tracking;

pub use events::{EventAck, FulfillmentEvent, OrderEvent};
pub use responses::{OtoResponse, RefreshTokenRequest, RefreshTokenResponse};
pub use shipment::{CreateOrderRequest, Customer, OrderItem, OrderReference, PaymentMethod};
pub use tracking::TrackingUpdate;

use serde::{Deserialize, Deserializer};

/// A JSON scalar that OTO sends either quoted or bare (ids, timestamps).
#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl From<TextOrNumber> for String {
    fn from(value: TextOrNumber) -> Self {
        match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }
    }
}

pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    TextOrNumber::deserialize(deserializer).map(Into::into)
}

pub(crate) fn optional_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TextOrNumber>::deserialize(deserializer).map(|value| value.map(Into::into))
}
