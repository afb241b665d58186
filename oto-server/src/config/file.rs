//! TOML file configuration structures.
//!
//! These structs directly map to the `oto-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub oto: OtoConfig,
    pub host: HostConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// OTO plugin section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtoConfig {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// HMAC key OTO signs tracking callbacks with.
    #[serde(default)]
    pub public_key_for_signature: String,
    /// Defaults to the production API when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    pub store_name: String,
    /// Prefix for product image paths, e.g. `https://shop.example`.
    pub site_domain: String,
    #[serde(default = "default_cod_gateways")]
    pub cod_gateways: Vec<String>,
    #[serde(default = "default_service_account_email")]
    pub service_account_email: String,
    #[serde(default = "default_token_refresh_interval_secs")]
    pub token_refresh_interval_secs: u64,
}

fn default_cod_gateways() -> Vec<String> {
    vec!["payments.cash".to_owned()]
}

fn default_service_account_email() -> String {
    "admin@example.com".to_owned()
}

fn default_token_refresh_interval_secs() -> u64 {
    12 * 60 * 60
}

/// Host platform section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Shared secret the host signs its events with.
    pub secret: String,
}
