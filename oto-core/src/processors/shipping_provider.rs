use async_trait::async_trait;
use oto_sdk::client::{ClientError, OtoClient};
use oto_sdk::objects::{CreateOrderRequest, OrderReference, OtoResponse, RefreshTokenResponse};

use crate::config::{ConfigStore, OtoSettings};

/// The OTO order endpoints used by [`fulfillment_sync`](super::fulfillment_sync).
#[async_trait]
pub trait ShippingProvider: Send + Sync {
    async fn create_order(&self, order: &CreateOrderRequest) -> Result<OtoResponse, ClientError>;
    async fn cancel_order(&self, order: &OrderReference) -> Result<OtoResponse, ClientError>;
    async fn get_return_link(&self, order: &OrderReference) -> Result<OtoResponse, ClientError>;
}

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn refresh_token(&self, refresh_token: &str)
    -> Result<RefreshTokenResponse, ClientError>;
}

/// [`ShippingProvider`] calling the real OTO API with the access token
/// currently held in the settings store.
#[derive(Clone)]
pub struct OtoProvider {
    client: OtoClient,
    settings: ConfigStore<OtoSettings>,
}

impl OtoProvider {
    pub fn new(client: OtoClient, settings: ConfigStore<OtoSettings>) -> Self {
        Self { client, settings }
    }

    async fn access_token(&self) -> String {
        self.settings.read().await.access_token.clone()
    }
}

#[async_trait]
impl ShippingProvider for OtoProvider {
    async fn create_order(&self, order: &CreateOrderRequest) -> Result<OtoResponse, ClientError> {
        let token = self.access_token().await;
        self.client.create_order(&token, order).await
    }

    async fn cancel_order(&self, order: &OrderReference) -> Result<OtoResponse, ClientError> {
        let token = self.access_token().await;
        self.client.cancel_order(&token, order).await
    }

    async fn get_return_link(&self, order: &OrderReference) -> Result<OtoResponse, ClientError> {
        let token = self.access_token().await;
        self.client.get_return_link(&token, order).await
    }
}

#[async_trait]
impl TokenIssuer for OtoClient {
    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshTokenResponse, ClientError> {
        OtoClient::refresh_token(self, refresh_token).await
    }
}
