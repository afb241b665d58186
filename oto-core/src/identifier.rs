//! The order id the bridge registers with OTO.
//!
//! OTO knows a fulfillment as `#{order_pk}-{fulfillment_order}`: a `#`
//! followed by the host's composed fulfillment id. Tracking callbacks echo
//! it back, and parsing it recovers the `(order, sequence)` pair used to
//! find the fulfillment again.

use std::fmt;
use std::str::FromStr;

use crate::entities::fulfillments::Fulfillment;

/// Errors from parsing an OTO order id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderIdError {
    #[error("order id `{0}` has no `-` separator")]
    MissingSeparator(String),
    #[error("order id `{0}` has no `#` prefix")]
    MissingPrefix(String),
    #[error("order id `{0}` does not hold a numeric order key")]
    InvalidOrderKey(String),
    #[error("order id `{0}` does not hold a numeric fulfillment sequence")]
    InvalidSequence(String),
}

/// `(order primary key, fulfillment sequence)` as carried in an OTO order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OtoOrderId {
    pub order_id: i64,
    pub fulfillment_order: i32,
}

impl OtoOrderId {
    pub fn for_fulfillment(fulfillment: &Fulfillment) -> Self {
        Self {
            order_id: fulfillment.order_id,
            fulfillment_order: fulfillment.fulfillment_order,
        }
    }
}

impl fmt::Display for OtoOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}-{}", self.order_id, self.fulfillment_order)
    }
}

impl FromStr for OtoOrderId {
    type Err = OrderIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (order_part, sequence) = raw
            .split_once('-')
            .ok_or_else(|| OrderIdError::MissingSeparator(raw.to_owned()))?;
        let (_, order_key) = order_part
            .split_once('#')
            .ok_or_else(|| OrderIdError::MissingPrefix(raw.to_owned()))?;
        let order_id = order_key
            .parse()
            .map_err(|_| OrderIdError::InvalidOrderKey(raw.to_owned()))?;
        let fulfillment_order = sequence
            .parse()
            .map_err(|_| OrderIdError::InvalidSequence(raw.to_owned()))?;
        Ok(Self {
            order_id,
            fulfillment_order,
        })
    }
}
