//! Processors for the OTO bridge.
//!
//! - `tracking_webhook`: authenticates OTO tracking callbacks and reconciles
//!   fulfillment status.
//! - `fulfillment_sync`: pushes host fulfillment events to OTO.
//! - `shipping_provider`: the OTO calls the processors depend on.
//! - `token_refresher`: rotates the OTO access token in the background.

pub mod fulfillment_sync;
pub mod shipping_provider;
pub mod token_refresher;
pub mod tracking_webhook;

pub use fulfillment_sync::{SyncError, SyncOutcome};
pub use shipping_provider::{OtoProvider, ShippingProvider, TokenIssuer};
pub use token_refresher::{RefreshError, RefreshOutcome, TokenRefresher};
pub use tracking_webhook::{WebhookContext, WebhookError, WebhookOutcome, handle_webhook};
