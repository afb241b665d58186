//! Application state shared across all request handlers.

use crate::config::HostSecret;
use oto_core::config::{ConfigStore, OtoSettings};
use oto_core::processors::ShippingProvider;
use oto_core::store::FulfillmentStore;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Host database access.
    pub store: Arc<dyn FulfillmentStore>,
    /// Outbound OTO API.
    pub provider: Arc<dyn ShippingProvider>,
    /// OTO settings (reloaded via SIGHUP, access token rotated in place).
    pub settings: ConfigStore<OtoSettings>,
    /// Host event signing secret (reloaded via SIGHUP).
    pub host: ConfigStore<HostSecret>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn FulfillmentStore>,
        provider: Arc<dyn ShippingProvider>,
        settings: ConfigStore<OtoSettings>,
        host: ConfigStore<HostSecret>,
    ) -> Self {
        Self {
            store,
            provider,
            settings,
            host,
        }
    }
}
