use url::Url;

/// Merchant-facing values that end up in outbound payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreProfile {
    /// Sent to OTO as `storeName`.
    pub name: String,
    /// Prefixed to product image paths.
    pub site_domain: String,
    /// Payment gateways that mean cash on delivery.
    pub cod_gateways: Vec<String>,
}

impl StoreProfile {
    pub fn is_cod_gateway(&self, gateway: &str) -> bool {
        self.cod_gateways.iter().any(|cod| cod == gateway)
    }
}

/// Validated OTO plugin settings.
#[derive(Debug, Clone)]
pub struct OtoSettings {
    /// An inactive plugin ignores host events and webhooks.
    pub active: bool,
    pub access_token: String,
    pub refresh_token: String,
    /// `PUBLIC_KEY_FOR_SIGNATURE`: HMAC key for tracking webhooks.
    pub signature_key: Box<[u8]>,
    pub base_url: Url,
    pub store: StoreProfile,
    /// Identity the cancellation action is attributed to.
    pub service_account_email: String,
}

impl OtoSettings {
    /// Credentials an active plugin cannot work without, by config key.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_token.is_empty() {
            missing.push("ACCESS_TOKEN");
        }
        if self.refresh_token.is_empty() {
            missing.push("REFRESH_TOKEN");
        }
        if self.signature_key.is_empty() {
            missing.push("PUBLIC_KEY_FOR_SIGNATURE");
        }
        missing
    }
}
