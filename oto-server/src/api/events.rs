//! Host event routes.
//!
//! The host calls these after committing a fulfillment or order change.
//! Each route runs one fulfillment sync flow and answers with an
//! [`EventAck`].

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use oto_core::processors::fulfillment_sync::{
    fulfillment_canceled, fulfillment_created, order_updated,
};
use oto_core::processors::{SyncError, SyncOutcome};
use oto_sdk::objects::{EventAck, FulfillmentEvent, OrderEvent};

use crate::api::extractors::SignedBody;
use crate::state::AppState;

pub struct EventError(SyncError);

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SyncError::FulfillmentNotFound(_) | SyncError::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SyncError::ProviderRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SyncError::Client(_) => StatusCode::BAD_GATEWAY,
            SyncError::Payload(_) | SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Host event failed");
        } else {
            tracing::warn!(error = %self.0, "Host event rejected");
        }
        (status, self.0.to_string()).into_response()
    }
}

fn ack(outcome: SyncOutcome) -> Json<EventAck> {
    Json(match outcome {
        SyncOutcome::Skipped | SyncOutcome::NothingToDo => EventAck {
            handled: false,
            oto_id: None,
        },
        SyncOutcome::Created { oto_id } => EventAck {
            handled: true,
            oto_id,
        },
        SyncOutcome::Canceled | SyncOutcome::ReturnLinks { .. } => EventAck {
            handled: true,
            oto_id: None,
        },
    })
}

/// `POST /events/fulfillment-created`
pub async fn on_fulfillment_created(
    State(state): State<AppState>,
    SignedBody(event): SignedBody<FulfillmentEvent>,
) -> Result<Json<EventAck>, EventError> {
    let settings = state.settings.snapshot().await;
    fulfillment_created(
        event.fulfillment_id,
        &settings,
        state.store.as_ref(),
        state.provider.as_ref(),
    )
    .await
    .map(ack)
    .map_err(EventError)
}

/// `POST /events/fulfillment-canceled`
pub async fn on_fulfillment_canceled(
    State(state): State<AppState>,
    SignedBody(event): SignedBody<FulfillmentEvent>,
) -> Result<Json<EventAck>, EventError> {
    let settings = state.settings.snapshot().await;
    fulfillment_canceled(
        event.fulfillment_id,
        &settings,
        state.store.as_ref(),
        state.provider.as_ref(),
    )
    .await
    .map(ack)
    .map_err(EventError)
}

/// `POST /events/order-updated`
pub async fn on_order_updated(
    State(state): State<AppState>,
    SignedBody(event): SignedBody<OrderEvent>,
) -> Result<Json<EventAck>, EventError> {
    let settings = state.settings.snapshot().await;
    order_updated(
        event.order_id,
        &settings,
        state.store.as_ref(),
        state.provider.as_ref(),
    )
    .await
    .map(ack)
    .map_err(EventError)
}
