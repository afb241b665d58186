//! SDK for the OTO shipping bridge.
//!
//! Holds the wire types exchanged with the OTO API and with the host
//! platform, the HMAC signature helpers, and (behind the `client` feature)
//! a typed HTTP client for the OTO REST API.

#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;
