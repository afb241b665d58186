//! Signature algorithms used by the bridge.
//!
//! Two HMAC-SHA256 schemes are in play:
//!
//! * **Tracking webhooks** (OTO → bridge): the provider signs
//!   `"{orderId}:{status}:{timestamp}"` with the shared
//!   `PUBLIC_KEY_FOR_SIGNATURE` and sends the padded base64 digest in the
//!   `signature` field of the JSON body.
//!
//! * **Host events** (host platform → bridge): the host signs
//!   `"{timestamp}.{json_body}"` with the host secret and sends
//!
//!   ```text
//!   X-Host-Signature: {unix_timestamp}.{base64_signature}
//!   ```
//!
//! Verification always goes through [`ring::hmac::verify`], which compares
//! digests in constant time.

/// Header name for the host event HMAC signature.
pub const HOST_SIGNATURE_HEADER: &str = "X-Host-Signature";

/// Maximum allowed age of a host event signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Marker trait for types that can participate in body signing via
/// [`SignedObject`].
pub trait Signature: for<'de> serde::Deserialize<'de> + serde::Serialize {}

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn hmac_key(key: &[u8]) -> ring::hmac::Key {
    ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key)
}

// ---------------------------------------------------------------------------
// Tracking webhook signing (OTO)
// ---------------------------------------------------------------------------

/// The string OTO signs for a tracking callback.
pub fn tracking_message(order_id: &str, status: &str, timestamp: &str) -> String {
    format!("{order_id}:{status}:{timestamp}")
}

/// Compute the base64 signature OTO attaches to a tracking callback.
pub fn sign_tracking(order_id: &str, status: &str, timestamp: &str, key: &[u8]) -> String {
    let message = tracking_message(order_id, status, timestamp);
    let tag = ring::hmac::sign(&hmac_key(key), message.as_bytes());
    fast32::base64::RFC4648.encode(tag.as_ref())
}

/// Verify the base64 `signature` of a tracking callback.
pub fn verify_tracking(
    order_id: &str,
    status: &str,
    timestamp: &str,
    signature: &str,
    key: &[u8],
) -> Result<(), SignatureError> {
    let expected = fast32::base64::RFC4648
        .decode_str(signature)
        .map_err(|_| SignatureError::InvalidBase64)?;
    let message = tracking_message(order_id, status, timestamp);
    ring::hmac::verify(&hmac_key(key), message.as_bytes(), &expected)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SignedObject: host event body signing
// ---------------------------------------------------------------------------

/// A signed host event body carrying its typed payload, timestamp, raw JSON,
/// and HMAC-SHA256 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedObject<T: Signature> {
    pub body: T,
    pub timestamp: i64,
    pub json: String,
    pub signature: Box<[u8]>,
}

impl<T: Signature> SignedObject<T> {
    /// Serialize `body`, sign `"{now}.{json}"` with `key` and assemble the
    /// [`SignedObject`].
    pub fn new(body: T, key: &[u8]) -> Result<Self, serde_json::Error> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        Self::new_at(body, key, now)
    }

    fn new_at(body: T, key: &[u8], timestamp: i64) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(&body)?;
        let data = format!("{timestamp}.{json}");
        let signature = ring::hmac::sign(&hmac_key(key), data.as_bytes());
        Ok(Self {
            body,
            timestamp,
            json,
            signature: signature.as_ref().to_owned().into_boxed_slice(),
        })
    }

    /// Reconstruct a [`SignedObject`] from a raw `X-Host-Signature` header
    /// value and the JSON request body.
    ///
    /// This parses the header and deserializes the body but does **not**
    /// verify the HMAC; call [`verify`](Self::verify) for that.
    pub fn from_header_and_body(
        header_value: &str,
        body_json: String,
    ) -> Result<Self, SignatureError> {
        let (timestamp, signature) = parse_signature_header(header_value)?;
        let body: T = serde_json::from_str(&body_json)?;
        Ok(Self {
            body,
            timestamp,
            json: body_json,
            signature,
        })
    }

    /// Verify the HMAC signature and timestamp freshness, consuming `self`
    /// and returning the authenticated payload.
    pub fn verify(self, key: &[u8]) -> Result<T, SignatureError> {
        let data = format!("{}.{}", self.timestamp, self.json);
        ring::hmac::verify(&hmac_key(key), data.as_bytes(), self.signature.as_ref())?;
        check_timestamp(self.timestamp)?;
        Ok(self.body)
    }

    /// Format the full `X-Host-Signature` header value (`{timestamp}.{b64}`).
    pub fn to_header(&self) -> String {
        format_signature_header(self.timestamp, &self.signature)
    }
}

/// Parse a `{timestamp}.{base64}` header value into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, encoded) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(encoded)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`].
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now - timestamp > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    const KEY: &[u8] = b"oto-secret";

    #[test]
    fn tracking_signature_matches_provider_digest() {
        let signature = sign_tracking("#42-1", "canceled", "1700000000", KEY);
        assert_eq!(signature, "22uCGeAEwSBSV4wWvtyqKPcur1psCSEqnux8VvntV9g=");
        assert!(verify_tracking("#42-1", "canceled", "1700000000", &signature, KEY).is_ok());
    }

    #[test]
    fn tracking_signature_rejects_any_mutation() {
        let signature = sign_tracking("#42-1", "canceled", "1700000000", KEY);

        let cases = [
            ("#42-2", "canceled", "1700000000", KEY),
            ("#42-1", "delivered", "1700000000", KEY),
            ("#42-1", "canceled", "1700000001", KEY),
            ("#42-1", "canceled", "1700000000", b"other-secret".as_slice()),
        ];
        for (order_id, status, timestamp, key) in cases {
            let result = verify_tracking(order_id, status, timestamp, &signature, key);
            assert!(
                matches!(result, Err(SignatureError::SignatureMismatch)),
                "{order_id}:{status}:{timestamp} should not verify"
            );
        }
    }

    #[test]
    fn tracking_signature_rejects_garbage_encoding() {
        let result = verify_tracking("#42-1", "canceled", "1700000000", "not base64!", KEY);
        assert!(matches!(result, Err(SignatureError::InvalidBase64)));
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Ping {
        id: i64,
    }

    impl Signature for Ping {}

    #[test]
    fn signed_object_survives_header_round_trip() {
        let signed = SignedObject::new(Ping { id: 7 }, KEY).unwrap();
        let header = signed.to_header();
        let parsed = SignedObject::<Ping>::from_header_and_body(&header, signed.json).unwrap();
        assert_eq!(parsed.verify(KEY).unwrap(), Ping { id: 7 });
    }

    #[test]
    fn signed_object_rejects_wrong_key_and_stale_timestamp() {
        let signed = SignedObject::new(Ping { id: 7 }, KEY).unwrap();
        assert!(matches!(
            signed.verify(b"wrong"),
            Err(SignatureError::SignatureMismatch)
        ));

        let stale = time::OffsetDateTime::now_utc().unix_timestamp() - MAX_SIGNATURE_AGE - 10;
        let signed = SignedObject::new_at(Ping { id: 7 }, KEY, stale).unwrap();
        assert!(matches!(signed.verify(KEY), Err(SignatureError::Expired)));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(matches!(
            parse_signature_header("no-dot-here"),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            parse_signature_header("abc.AAAA"),
            Err(SignatureError::InvalidFormat)
        ));
    }
}
