//! TokenRefresher processor.
//!
//! Periodically trades the configured refresh token for a fresh OTO access
//! token and writes it into the settings store. Watchers of the store (the
//! server persists the config file) pick the new token up from there.

use std::sync::Arc;
use std::time::Duration;

use oto_sdk::client::ClientError;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigStore, OtoSettings};
use crate::processors::TokenIssuer;

/// Default time between two refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("token refresh request failed: {0}")]
    Client(#[from] ClientError),
    #[error("OTO returned no access token")]
    MissingAccessToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No refresh token is configured.
    Skipped,
    Refreshed,
}

pub struct TokenRefresher<I: ?Sized> {
    issuer: Arc<I>,
    settings: ConfigStore<OtoSettings>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl<I: TokenIssuer + ?Sized> TokenRefresher<I> {
    pub fn new(
        issuer: Arc<I>,
        settings: ConfigStore<OtoSettings>,
        interval: Duration,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            issuer,
            settings,
            interval,
            shutdown_rx,
        }
    }

    /// Run until the shutdown signal flips to `true`.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "TokenRefresher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("TokenRefresher received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(self.interval) => {
                    match self.refresh_once().await {
                        Ok(RefreshOutcome::Refreshed) => info!("OTO access token refreshed"),
                        Ok(RefreshOutcome::Skipped) => {
                            debug!("No OTO refresh token configured, skipping refresh")
                        }
                        Err(e) => error!(error = %e, "Failed to refresh OTO access token"),
                    }
                }
            }
        }

        info!("TokenRefresher shutdown complete");
    }

    /// Perform a single refresh against the issuer.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, RefreshError> {
        let refresh_token = self.settings.read().await.refresh_token.clone();
        if refresh_token.is_empty() {
            return Ok(RefreshOutcome::Skipped);
        }

        let response = self.issuer.refresh_token(&refresh_token).await?;
        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(RefreshError::MissingAccessToken)?;

        let interval_secs = i64::try_from(self.interval.as_secs()).unwrap_or(i64::MAX);
        if response.expires_in.is_some_and(|expires_in| expires_in < interval_secs) {
            warn!(
                expires_in = response.expires_in,
                interval_secs,
                "OTO access token expires before the next scheduled refresh"
            );
        }

        self.settings
            .modify(|settings| settings.access_token = access_token)
            .await;
        Ok(RefreshOutcome::Refreshed)
    }
}
