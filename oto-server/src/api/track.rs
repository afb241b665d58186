//! OTO plugin routes: the tracking webhook and the not-found fallback.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use oto_core::processors::{WebhookContext, WebhookError, WebhookOutcome, handle_webhook};

use crate::state::AppState;

/// Error wrapper turning [`WebhookError`] into a response.
pub struct TrackError(WebhookError);

impl IntoResponse for TrackError {
    fn into_response(self) -> Response {
        match self.0 {
            WebhookError::MalformedBody(e) => {
                (StatusCode::BAD_REQUEST, format!("Malformed webhook body: {e}")).into_response()
            }
            WebhookError::MalformedOrderId(e) => {
                (StatusCode::BAD_REQUEST, format!("Malformed orderId: {e}")).into_response()
            }
            WebhookError::Unverified => {
                (StatusCode::FORBIDDEN, "Webhook is not verified!").into_response()
            }
            WebhookError::InvalidSignature => {
                (StatusCode::FORBIDDEN, "Invalid signature").into_response()
            }
            WebhookError::Store(e) => {
                tracing::error!(error = %e, "Failed to reconcile OTO webhook");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// `POST /plugins/oto/track/`
pub async fn track(State(state): State<AppState>, body: Bytes) -> Result<Response, TrackError> {
    let settings = state.settings.snapshot().await;
    if !settings.active {
        return Ok(plugin_inactive());
    }

    let context = WebhookContext {
        signature_key: &settings.signature_key,
        service_account_email: &settings.service_account_email,
    };
    let outcome = handle_webhook(&body, context, state.store.as_ref())
        .await
        .map_err(TrackError)?;
    tracing::info!("Finish handling webhook from OTO!");

    Ok(match outcome {
        WebhookOutcome::Updated { .. } => (StatusCode::OK, "OK").into_response(),
        WebhookOutcome::NotFound { order_id } => (
            StatusCode::OK,
            format!("Fulfillment {order_id} not found"),
        )
            .into_response(),
    })
}

/// Any other path or method under `/plugins/oto/`.
pub async fn invalid_path(State(state): State<AppState>) -> Response {
    if !state.settings.read().await.active {
        return plugin_inactive();
    }
    tracing::info!("Invalid webhook path from OTO!");
    (StatusCode::NOT_FOUND, "This OTO path is not valid!").into_response()
}

fn plugin_inactive() -> Response {
    (StatusCode::NOT_FOUND, "OTO plugin is not active").into_response()
}
