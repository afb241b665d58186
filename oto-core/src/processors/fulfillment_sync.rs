//! Pushes host fulfillment events to OTO.
//!
//! - fulfillment created: register the shipment with `createOrder` and
//!   remember its OTO order id on the host order
//! - fulfillment canceled: `cancelOrder`
//! - order updated: fetch return links once the last fulfillment is returned
//!
//! Every flow is a no-op while the plugin is inactive.

use oto_sdk::client::ClientError;
use oto_sdk::objects::OrderReference;
use serde_json::Value;
use tracing::{error, info};

use crate::config::OtoSettings;
use crate::entities::Metadata;
use crate::payload::{PayloadError, build_cancel_order_payload, build_create_order_payload};
use crate::processors::ShippingProvider;
use crate::store::{FulfillmentStore, StoreError};

/// Order metadata key listing every OTO order id created for the order.
pub const OTO_FULFILLMENT_IDS: &str = "oto_fulfillment_ids";
/// Order and fulfillment metadata key holding the latest return link.
pub const OTO_RETURN_LINK: &str = "oto_return_link";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The plugin is inactive.
    Skipped,
    Created { oto_id: Option<String> },
    Canceled,
    /// The order's last fulfillment is not returned.
    NothingToDo,
    ReturnLinks { stored: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("fulfillment {0} not found")]
    FulfillmentNotFound(i64),
    #[error("order {0} not found")]
    OrderNotFound(i64),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("OTO request failed: {0}")]
    Client(#[from] ClientError),
    /// OTO answered with `success: false`.
    #[error("{0}")]
    ProviderRejected(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Register a newly created fulfillment with OTO.
pub async fn fulfillment_created<S, P>(
    fulfillment_id: i64,
    settings: &OtoSettings,
    store: &S,
    provider: &P,
) -> Result<SyncOutcome, SyncError>
where
    S: FulfillmentStore + ?Sized,
    P: ShippingProvider + ?Sized,
{
    if !settings.active {
        return Ok(SyncOutcome::Skipped);
    }

    let aggregate = store
        .load_aggregate(fulfillment_id)
        .await?
        .ok_or(SyncError::FulfillmentNotFound(fulfillment_id))?;
    let order_id = aggregate.order.id;
    let payload = build_create_order_payload(&aggregate, &settings.store)?;

    let response = provider.create_order(&payload).await?;
    if !response.success {
        let msg = response.rejection_message(|| {
            format!(
                "Can not create an OTO order for fulfillment {}",
                aggregate.fulfillment.composed_id()
            )
        });
        error!(order_id, "{}", msg);
        return Err(SyncError::ProviderRejected(msg));
    }

    let mut metadata = store
        .order_metadata(order_id)
        .await?
        .ok_or(SyncError::OrderNotFound(order_id))?;
    remember_oto_id(&mut metadata, &payload.order_id);
    store.save_order_metadata(order_id, metadata).await?;

    info!(
        order_id,
        oto_id = response.oto_id.as_deref().unwrap_or_default(),
        "OTO order {} created",
        response.oto_id.as_deref().unwrap_or(&payload.order_id)
    );
    Ok(SyncOutcome::Created {
        oto_id: response.oto_id,
    })
}

/// Cancel the OTO order of a canceled fulfillment.
pub async fn fulfillment_canceled<S, P>(
    fulfillment_id: i64,
    settings: &OtoSettings,
    store: &S,
    provider: &P,
) -> Result<SyncOutcome, SyncError>
where
    S: FulfillmentStore + ?Sized,
    P: ShippingProvider + ?Sized,
{
    if !settings.active {
        return Ok(SyncOutcome::Skipped);
    }

    let fulfillment = store
        .get_fulfillment(fulfillment_id)
        .await?
        .ok_or(SyncError::FulfillmentNotFound(fulfillment_id))?;

    let response = provider
        .cancel_order(&build_cancel_order_payload(&fulfillment))
        .await?;
    if !response.success {
        let msg = response
            .rejection_message(|| format!("Can not cancel an OTO order {}", fulfillment.order_id));
        error!(order_id = fulfillment.order_id, "{}", msg);
        return Err(SyncError::ProviderRejected(msg));
    }

    info!(
        fulfillment = %fulfillment.composed_id(),
        "OTO order {} canceled",
        fulfillment.composed_id()
    );
    Ok(SyncOutcome::Canceled)
}

/// Fetch return links when the order's last fulfillment came back.
///
/// Every OTO order recorded for the host order is asked for a link; each
/// link overwrites `oto_return_link` on the returned fulfillment and on the
/// order.
pub async fn order_updated<S, P>(
    order_id: i64,
    settings: &OtoSettings,
    store: &S,
    provider: &P,
) -> Result<SyncOutcome, SyncError>
where
    S: FulfillmentStore + ?Sized,
    P: ShippingProvider + ?Sized,
{
    if !settings.active {
        return Ok(SyncOutcome::Skipped);
    }

    let Some(mut returned) = store.last_fulfillment(order_id).await? else {
        return Ok(SyncOutcome::NothingToDo);
    };
    if !returned.status.is_returned() {
        return Ok(SyncOutcome::NothingToDo);
    }

    let mut order_metadata = store
        .order_metadata(order_id)
        .await?
        .ok_or(SyncError::OrderNotFound(order_id))?;
    let oto_ids = recorded_oto_ids(&order_metadata);

    let mut stored = 0;
    for oto_id in oto_ids {
        let response = provider
            .get_return_link(&OrderReference {
                order_id: oto_id.clone(),
            })
            .await?;
        if !response.success {
            let msg = response
                .rejection_message(|| format!("Can not get an OTO return link for {oto_id}"));
            error!(order_id, oto_id = %oto_id, "{}", msg);
            return Err(SyncError::ProviderRejected(msg));
        }

        let link = Value::from(response.return_link.unwrap_or_default());
        returned
            .metadata
            .0
            .insert(OTO_RETURN_LINK.to_owned(), link.clone());
        store.save_fulfillment_metadata(&returned).await?;
        order_metadata.insert(OTO_RETURN_LINK.to_owned(), link);
        store
            .save_order_metadata(order_id, order_metadata.clone())
            .await?;
        stored += 1;

        info!(order_id, oto_id = %oto_id, "Stored OTO return link");
    }

    Ok(SyncOutcome::ReturnLinks { stored })
}

fn recorded_oto_ids(metadata: &Metadata) -> Vec<String> {
    metadata
        .get(OTO_FULFILLMENT_IDS)
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn remember_oto_id(metadata: &mut Metadata, oto_id: &str) {
    let mut ids = recorded_oto_ids(metadata);
    if !ids.iter().any(|id| id == oto_id) {
        ids.push(oto_id.to_owned());
    }
    metadata.insert(OTO_FULFILLMENT_IDS.to_owned(), Value::from(ids));
}
