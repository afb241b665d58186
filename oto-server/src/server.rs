//! Axum server setup and router configuration.

use crate::api::{events, track};
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{any, get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // OTO webhook; other methods fall through to the invalid-path reply
        .route(
            "/plugins/oto/track/",
            post(track::track).fallback(track::invalid_path),
        )
        .route("/plugins/oto", any(track::invalid_path))
        .route("/plugins/oto/", any(track::invalid_path))
        .route("/plugins/oto/{*rest}", any(track::invalid_path))
        // Host events
        .route(
            "/events/fulfillment-created",
            post(events::on_fulfillment_created),
        )
        .route(
            "/events/fulfillment-canceled",
            post(events::on_fulfillment_canceled),
        )
        .route("/events/order-updated", post(events::on_order_updated))
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
