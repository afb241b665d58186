pub mod fulfillments;
pub mod orders;
pub mod users;

/// Free-form key/value metadata attached to host orders and fulfillments.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Fulfillment status as stored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "fulfillment_status")]
pub enum FulfillmentStatus {
    Fulfilled,
    Refunded,
    Returned,
    Replaced,
    RefundedAndReturned,
    Canceled,
    WaitingForApproval,
}

impl FulfillmentStatus {
    /// Statuses for which OTO should issue a return link.
    pub fn is_returned(self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Returned | FulfillmentStatus::RefundedAndReturned
        )
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentStatus::Fulfilled => write!(f, "fulfilled"),
            FulfillmentStatus::Refunded => write!(f, "refunded"),
            FulfillmentStatus::Returned => write!(f, "returned"),
            FulfillmentStatus::Replaced => write!(f, "replaced"),
            FulfillmentStatus::RefundedAndReturned => write!(f, "refunded_and_returned"),
            FulfillmentStatus::Canceled => write!(f, "canceled"),
            FulfillmentStatus::WaitingForApproval => write!(f, "waiting_for_approval"),
        }
    }
}
