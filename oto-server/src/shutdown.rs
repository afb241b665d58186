//! Signal handling for graceful shutdown and config reload, plus the task
//! writing rotated access tokens back to the config file.

use crate::config::ConfigLoader;
use crate::state::AppState;
use oto_core::config::{ConfigStore, OtoSettings};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::{Notify, watch};

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C).
pub async fn shutdown_signal() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to install signal handlers: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// Returns a Notify that can be used to signal when shutdown is complete.
pub fn spawn_config_reload_handler(
    state: AppState,
    config_loader: Arc<ConfigLoader>,
) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!("Failed to install SIGHUP handler: {}", e);
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    match config_loader.reload() {
                        Ok(loaded_config) => {
                            let previous_base_url = state.settings.read().await.base_url.clone();
                            if previous_base_url != loaded_config.oto.base_url {
                                tracing::warn!(
                                    "OTO base_url changed to {}; restart to apply it",
                                    loaded_config.oto.base_url
                                );
                            }
                            state
                                .settings
                                .modify(|current| apply_reload(current, loaded_config.oto))
                                .await;
                            state.host.update(loaded_config.host).await;
                            tracing::info!("Configuration reloaded successfully");
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload configuration: {}", e);
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}

/// Replaces the running OTO settings with a reloaded copy.
///
/// The access token in memory wins over the file: the refresher may have
/// rotated it after the file was last written. The base URL stays at the
/// one the client was built with.
fn apply_reload(current: &mut OtoSettings, mut reloaded: OtoSettings) {
    if !current.access_token.is_empty() {
        reloaded.access_token = std::mem::take(&mut current.access_token);
    }
    reloaded.base_url = current.base_url.clone();
    *current = reloaded;
}

/// Spawns a task that writes every new access token to the config file.
pub fn spawn_token_persister(
    settings: ConfigStore<OtoSettings>,
    config_loader: Arc<ConfigLoader>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut watcher = settings.subscribe();
        let mut persisted = settings.read().await.access_token.clone();

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }

                changed = watcher.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = settings.read().await.access_token.clone();
                    if current == persisted {
                        continue;
                    }
                    match config_loader.persist_access_token(&current) {
                        Ok(()) => {
                            tracing::info!("Refreshed OTO access token written to config file");
                            persisted = current;
                        }
                        Err(e) => {
                            tracing::error!("Failed to persist OTO access token: {}", e);
                        }
                    }
                }
            }
        }

        tracing::debug!("Token persister shutting down");
    })
}
