//! Access to the host platform's order and fulfillment records.
//!
//! [`FulfillmentStore`] is the seam between the processors and the host.
//! [`PgStore`] talks to the host database; the in-memory store behind the
//! `memory` feature backs tests.
//!
//! Read-modify-write sequences (webhook metadata merge) take no locks here.
//! Concurrent deliveries for one fulfillment rely on the host database's
//! row-level atomicity for each single `UPDATE`.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
mod postgres;

pub use postgres::PgStore;

use async_trait::async_trait;

use crate::entities::Metadata;
use crate::entities::fulfillments::Fulfillment;
use crate::entities::users::ServiceAccount;
use crate::identifier::OtoOrderId;
use crate::payload::FulfillmentAggregate;

/// Errors from the host store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    /// Fulfillment plus everything the create-order payload needs.
    async fn load_aggregate(
        &self,
        fulfillment_id: i64,
    ) -> Result<Option<FulfillmentAggregate>, StoreError>;

    async fn get_fulfillment(&self, fulfillment_id: i64)
    -> Result<Option<Fulfillment>, StoreError>;

    /// Resolve the fulfillment an OTO order id points at.
    async fn find_by_oto_id(&self, oto_id: OtoOrderId) -> Result<Option<Fulfillment>, StoreError>;

    /// The order's most recently created fulfillment.
    async fn last_fulfillment(&self, order_id: i64) -> Result<Option<Fulfillment>, StoreError>;

    /// Persist `tracking_number` and `metadata`, and nothing else.
    async fn save_tracking(&self, fulfillment: &Fulfillment) -> Result<(), StoreError>;

    async fn save_fulfillment_metadata(&self, fulfillment: &Fulfillment) -> Result<(), StoreError>;

    /// `None` when the order does not exist.
    async fn order_metadata(&self, order_id: i64) -> Result<Option<Metadata>, StoreError>;

    async fn save_order_metadata(&self, order_id: i64, metadata: Metadata)
    -> Result<(), StoreError>;

    /// Look up the service account by email, creating it when missing.
    async fn service_account(&self, email: &str) -> Result<ServiceAccount, StoreError>;

    /// The host's fulfillment-cancellation action, attributed to `actor`,
    /// with no warehouse and no app.
    async fn cancel_fulfillment(
        &self,
        fulfillment: &Fulfillment,
        actor: &ServiceAccount,
    ) -> Result<(), StoreError>;
}
