//! Response bodies returned by the OTO API.

use serde::{Deserialize, Serialize};

use super::optional_text_or_number;

/// Common envelope of `createOrder`, `cancelOrder` and `getReturnLink`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtoResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub oto_id: Option<String>,
    #[serde(default)]
    pub return_link: Option<String>,
}

impl OtoResponse {
    /// Message to surface for a rejected call.
    ///
    /// Uses the provider's `errorMsg` with its first letter upper-cased and
    /// the rest lower-cased, or `fallback` when OTO gave no reason.
    pub fn rejection_message(&self, fallback: impl FnOnce() -> String) -> String {
        match self.error_msg.as_deref().filter(|msg| !msg.is_empty()) {
            Some(msg) => capitalize(msg),
            None => fallback(),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Body of `POST refreshToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Response of `POST refreshToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_capitalizes_provider_reason() {
        let response: OtoResponse =
            serde_json::from_str(r#"{"success": false, "errorMsg": "order ALREADY exists"}"#)
                .unwrap();
        assert_eq!(
            response.rejection_message(|| "fallback".to_owned()),
            "Order already exists"
        );
    }

    #[test]
    fn rejection_message_falls_back_without_reason() {
        let response: OtoResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(response.rejection_message(|| "fallback".to_owned()), "fallback");
    }

    #[test]
    fn numeric_oto_id_is_accepted() {
        let response: OtoResponse =
            serde_json::from_str(r#"{"success": true, "otoId": 998877}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.oto_id.as_deref(), Some("998877"));
    }
}
