//! Tracking webhook reconciliation.
//!
//! For each OTO callback:
//! - parse the body and authenticate `orderId:status:timestamp`
//! - resolve the fulfillment from the OTO order id
//! - store the tracking number and merge the carrier fields into metadata
//! - run the host cancellation action when OTO reports `canceled`
//!
//! Re-delivering the same callback converges to the same stored state.

use oto_sdk::objects::TrackingUpdate;
use oto_sdk::signature::{self, SignatureError};
use serde_json::Value;
use tracing::{info, warn};

use crate::entities::fulfillments::Fulfillment;
use crate::identifier::{OrderIdError, OtoOrderId};
use crate::store::{FulfillmentStore, StoreError};

/// Metadata keys written from a tracking callback.
pub mod metadata_keys {
    pub const OTO_STATUS: &str = "otoStatus";
    pub const PRINT_AWB_URL: &str = "printAWBURL";
    pub const TRACKING_URL: &str = "trackingURL";
    pub const FEEDBACK_LINK: &str = "feedbackLink";
    pub const SHIPPING_COMPANY_STATUS: &str = "shippingCompanyStatus";
    pub const DELIVERY_COMPANY: &str = "deliveryCompany";
    pub const DELIVERY_SLOT_DATE: &str = "deliverySlotDate";
}

/// Settings the handler reads for one request.
#[derive(Debug, Clone, Copy)]
pub struct WebhookContext<'a> {
    /// `PUBLIC_KEY_FOR_SIGNATURE`
    pub signature_key: &'a [u8],
    pub service_account_email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Updated { fulfillment_id: i64, canceled: bool },
    /// No fulfillment matches; acknowledged without touching anything.
    NotFound { order_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("malformed webhook body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("malformed order id: {0}")]
    MalformedOrderId(#[from] OrderIdError),
    /// No signature, or one that is not base64.
    #[error("webhook is not verified")]
    Unverified,
    #[error("invalid signature")]
    InvalidSignature,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Check the callback's signature against `key` in constant time.
pub fn verify_update(update: &TrackingUpdate, key: &[u8]) -> Result<(), WebhookError> {
    let provided = update.signature.as_deref().ok_or(WebhookError::Unverified)?;
    signature::verify_tracking(
        &update.order_id,
        &update.status,
        &update.timestamp,
        provided,
        key,
    )
    .map_err(|e| match e {
        SignatureError::SignatureMismatch => WebhookError::InvalidSignature,
        _ => WebhookError::Unverified,
    })
}

/// Copy the callback onto the fulfillment: the tracking number plus seven
/// metadata keys. Other metadata keys are kept; absent fields become `""`.
pub fn apply_tracking_update(fulfillment: &mut Fulfillment, update: &TrackingUpdate) {
    use metadata_keys::*;

    fulfillment.tracking_number = update.tracking_number.clone().unwrap_or_default();

    let text = |field: &Option<String>| Value::String(field.clone().unwrap_or_default());
    let metadata = &mut fulfillment.metadata.0;
    metadata.insert(OTO_STATUS.to_owned(), Value::String(update.status.clone()));
    metadata.insert(PRINT_AWB_URL.to_owned(), text(&update.print_awb_url));
    metadata.insert(TRACKING_URL.to_owned(), text(&update.tracking_url));
    metadata.insert(FEEDBACK_LINK.to_owned(), text(&update.feedback_link));
    metadata.insert(SHIPPING_COMPANY_STATUS.to_owned(), text(&update.dc_status));
    metadata.insert(DELIVERY_COMPANY.to_owned(), text(&update.delivery_company));
    metadata.insert(DELIVERY_SLOT_DATE.to_owned(), text(&update.delivery_slot_date));
}

/// Handle one raw tracking callback body.
pub async fn handle_webhook<S>(
    body: &[u8],
    context: WebhookContext<'_>,
    store: &S,
) -> Result<WebhookOutcome, WebhookError>
where
    S: FulfillmentStore + ?Sized,
{
    let update: TrackingUpdate = serde_json::from_slice(body)?;

    if let Err(e) = verify_update(&update, context.signature_key) {
        warn!(order_id = %update.order_id, error = %e, "Rejected OTO webhook");
        return Err(e);
    }

    let oto_id: OtoOrderId = update.order_id.parse()?;

    let Some(mut fulfillment) = store.find_by_oto_id(oto_id).await? else {
        info!(order_id = %update.order_id, "Fulfillment {} not found", update.order_id);
        return Ok(WebhookOutcome::NotFound {
            order_id: update.order_id,
        });
    };

    apply_tracking_update(&mut fulfillment, &update);
    store.save_tracking(&fulfillment).await?;
    info!(
        fulfillment = %fulfillment.composed_id(),
        status = %update.status,
        "Fulfillment #{} updated",
        fulfillment.composed_id()
    );

    let canceled = update.is_canceled();
    if canceled {
        let actor = store.service_account(context.service_account_email).await?;
        store.cancel_fulfillment(&fulfillment, &actor).await?;
        info!(
            fulfillment = %fulfillment.composed_id(),
            actor = %actor.email,
            "Fulfillment #{} cancelled",
            fulfillment.composed_id()
        );
    }

    Ok(WebhookOutcome::Updated {
        fulfillment_id: fulfillment.id,
        canceled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::aggregate;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    const KEY: &[u8] = b"oto-secret";
    const SERVICE_ACCOUNT: &str = "admin@example.com";

    fn context() -> WebhookContext<'static> {
        WebhookContext {
            signature_key: KEY,
            service_account_email: SERVICE_ACCOUNT,
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::default();
        let mut agg = aggregate("stripe", 1);
        agg.fulfillment.metadata.0.insert("foo".to_owned(), json!("bar"));
        store.insert_aggregate(agg);
        store
    }

    fn signed_body(order_id: &str, status: &str) -> Vec<u8> {
        let timestamp = "1700000000";
        let signature = signature::sign_tracking(order_id, status, timestamp, KEY);
        serde_json::to_vec(&json!({
            "orderId": order_id,
            "status": status,
            "timestamp": timestamp,
            "signature": signature,
            "trackingNumber": "TRK-9",
            "printAWBURL": "https://oto.example/awb/9",
            "trackingURL": "https://oto.example/t/9",
            "dcStatus": "out_for_delivery",
            "deliveryCompany": "SMSA"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn updates_tracking_and_merges_metadata() {
        let store = seeded_store();

        let outcome = handle_webhook(&signed_body("#42-1", "shipped"), context(), &store)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Updated {
                fulfillment_id: 7,
                canceled: false
            }
        );

        let fulfillment = store.fulfillment(7).unwrap();
        assert_eq!(fulfillment.tracking_number, "TRK-9");
        let metadata = &fulfillment.metadata.0;
        assert_eq!(metadata["foo"], "bar");
        assert_eq!(metadata["otoStatus"], "shipped");
        assert_eq!(metadata["printAWBURL"], "https://oto.example/awb/9");
        assert_eq!(metadata["trackingURL"], "https://oto.example/t/9");
        assert_eq!(metadata["feedbackLink"], "");
        assert_eq!(metadata["shippingCompanyStatus"], "out_for_delivery");
        assert_eq!(metadata["deliveryCompany"], "SMSA");
        assert_eq!(metadata["deliverySlotDate"], "");
        assert_eq!(metadata.len(), 8);
        assert!(store.cancellations().is_empty());
    }

    #[tokio::test]
    async fn redelivery_is_idempotent() {
        let store = seeded_store();
        let body = signed_body("#42-1", "shipped");

        handle_webhook(&body, context(), &store).await.unwrap();
        let first = store.fulfillment(7).unwrap();
        handle_webhook(&body, context(), &store).await.unwrap();
        let second = store.fulfillment(7).unwrap();

        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.tracking_number, second.tracking_number);
    }

    #[tokio::test]
    async fn canceled_status_runs_one_cancellation() {
        let store = seeded_store();

        let outcome = handle_webhook(&signed_body("#42-1", "canceled"), context(), &store)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Updated {
                fulfillment_id: 7,
                canceled: true
            }
        );

        let cancellations = store.cancellations();
        assert_eq!(cancellations.len(), 1);
        assert_eq!(cancellations[0].0, 7);
        let actor = store.service_account(SERVICE_ACCOUNT).await.unwrap();
        assert_eq!(cancellations[0].1, actor.id);

        let fulfillment = store.fulfillment(7).unwrap();
        assert_eq!(fulfillment.tracking_number, "TRK-9");
        assert_eq!(fulfillment.metadata.0["otoStatus"], "canceled");
    }

    #[tokio::test]
    async fn unknown_fulfillment_is_acknowledged_without_writes() {
        let store = seeded_store();

        let outcome = handle_webhook(&signed_body("#99-3", "canceled"), context(), &store)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::NotFound {
                order_id: "#99-3".to_owned()
            }
        );
        assert_eq!(store.tracking_writes(), 0);
        assert!(store.cancellations().is_empty());
    }

    #[tokio::test]
    async fn bad_signature_touches_nothing() {
        let store = seeded_store();
        let mut body: Value = serde_json::from_slice(&signed_body("#42-1", "shipped")).unwrap();
        body["status"] = json!("canceled");
        let body = serde_json::to_vec(&body).unwrap();

        let result = handle_webhook(&body, context(), &store).await;
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert_eq!(store.tracking_writes(), 0);
        assert!(store.cancellations().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_is_unverified() {
        let store = seeded_store();
        let body = br##"{"orderId": "#42-1", "status": "shipped", "timestamp": "1"}"##;

        let result = handle_webhook(body, context(), &store).await;
        assert!(matches!(result, Err(WebhookError::Unverified)));
    }

    #[tokio::test]
    async fn malformed_payloads_fail_fast() {
        let store = seeded_store();

        let result = handle_webhook(b"not json", context(), &store).await;
        assert!(matches!(result, Err(WebhookError::MalformedBody(_))));

        let result = handle_webhook(&signed_body("42", "shipped"), context(), &store).await;
        assert!(matches!(result, Err(WebhookError::MalformedOrderId(_))));
        assert_eq!(store.tracking_writes(), 0);
    }

    #[tokio::test]
    async fn numeric_tracking_number_is_stored_as_text() {
        let store = seeded_store();
        let mut body: Value = serde_json::from_slice(&signed_body("#42-1", "shipped")).unwrap();
        body["trackingNumber"] = json!(123456789);
        let body = serde_json::to_vec(&body).unwrap();

        handle_webhook(&body, context(), &store).await.unwrap();
        assert_eq!(store.fulfillment(7).unwrap().tracking_number, "123456789");
    }
}
