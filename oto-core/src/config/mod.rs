//! Runtime configuration for the OTO bridge.
//!
//! These types hold the validated settings shared by the processors. Loading
//! and parsing the configuration file is handled by the server crate.

mod config_store;
mod settings;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use settings::{OtoSettings, StoreProfile};
