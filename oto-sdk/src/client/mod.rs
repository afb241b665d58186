//! HTTP client for the OTO REST API.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! wire types and signatures do not pull in `reqwest`.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::objects::{
    CreateOrderRequest, OrderReference, OtoResponse, RefreshTokenRequest, RefreshTokenResponse,
};

/// Production root of the OTO REST API.
pub const DEFAULT_BASE_URL: &str = "https://api.tryoto.com/rest/v2/";

/// Errors produced by [`OtoClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Typed HTTP client for the OTO API.
///
/// Order endpoints authenticate with a bearer access token that is passed
/// per call, because the token rotates while the client lives.
#[derive(Debug, Clone)]
pub struct OtoClient {
    http: Client,
    base_url: Url,
}

impl OtoClient {
    /// Create a client rooted at `base_url` (must end with `/`).
    pub fn new(base_url: Url) -> Self {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, base_url }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST createOrder`
    pub async fn create_order(
        &self,
        access_token: &str,
        order: &CreateOrderRequest,
    ) -> Result<OtoResponse, ClientError> {
        self.post_authorized("createOrder", access_token, order).await
    }

    /// `POST cancelOrder`
    pub async fn cancel_order(
        &self,
        access_token: &str,
        order: &OrderReference,
    ) -> Result<OtoResponse, ClientError> {
        self.post_authorized("cancelOrder", access_token, order).await
    }

    /// `POST getReturnLink`
    pub async fn get_return_link(
        &self,
        access_token: &str,
        order: &OrderReference,
    ) -> Result<OtoResponse, ClientError> {
        self.post_authorized("getReturnLink", access_token, order).await
    }

    /// `POST refreshToken`: exchange the refresh token for a new access
    /// token. Only an HTTP 200 counts as success.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshTokenResponse, ClientError> {
        let url = self.base_url.join("refreshToken")?;
        let body = RefreshTokenRequest {
            refresh_token: refresh_token.to_owned(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        if resp.status() != StatusCode::OK {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body });
        }
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::Json)
    }

    /// OTO answers order calls with a JSON envelope whose `success` flag
    /// carries the outcome, so the body is decoded whatever the status.
    async fn post_authorized<B: Serialize + ?Sized>(
        &self,
        path: &str,
        access_token: &str,
        body: &B,
    ) -> Result<OtoResponse, ClientError> {
        let url = self.base_url.join(path)?;
        tracing::debug!(%url, "Calling OTO");

        let resp = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        parse_response(resp).await
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    match serde_json::from_slice(&bytes) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(ClientError::Api {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }),
        Err(e) => Err(ClientError::Json(e)),
    }
}
