use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

use super::{FulfillmentStore, StoreError};
use crate::entities::Metadata;
use crate::entities::fulfillments::{
    CancelFulfillment, CountOrderFulfillments, Fulfillment, GetFulfillmentById,
    GetFulfillmentByOrderSequence, GetFulfillmentLines, GetLastOrderFulfillment,
    UpdateFulfillmentMetadata, UpdateFulfillmentTracking,
};
use crate::entities::orders::{
    GetLastPayment, GetOrderById, GetShippingAddress, UpdateOrderMetadata,
};
use crate::entities::users::{GetOrCreateServiceAccount, ServiceAccount};
use crate::framework::DatabaseProcessor;
use crate::identifier::OtoOrderId;
use crate::payload::FulfillmentAggregate;

/// [`FulfillmentStore`] backed by the host's PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PgStore {
    processor: DatabaseProcessor,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl FulfillmentStore for PgStore {
    async fn load_aggregate(
        &self,
        fulfillment_id: i64,
    ) -> Result<Option<FulfillmentAggregate>, StoreError> {
        let processor = &self.processor;

        let Some(fulfillment) = processor
            .process(GetFulfillmentById { fulfillment_id })
            .await?
        else {
            return Ok(None);
        };
        let order_id = fulfillment.order_id;
        let Some(order) = processor.process(GetOrderById { order_id }).await? else {
            return Ok(None);
        };

        let lines = processor
            .process(GetFulfillmentLines { fulfillment_id })
            .await?;
        let shipping_address = match order.shipping_address_id {
            Some(address_id) => processor.process(GetShippingAddress { address_id }).await?,
            None => None,
        };
        let last_payment = processor.process(GetLastPayment { order_id }).await?;
        let order_fulfillment_count = processor
            .process(CountOrderFulfillments { order_id })
            .await?;

        Ok(Some(FulfillmentAggregate {
            fulfillment,
            lines,
            order,
            shipping_address,
            last_payment,
            order_fulfillment_count,
        }))
    }

    async fn get_fulfillment(
        &self,
        fulfillment_id: i64,
    ) -> Result<Option<Fulfillment>, StoreError> {
        Ok(self
            .processor
            .process(GetFulfillmentById { fulfillment_id })
            .await?)
    }

    async fn find_by_oto_id(&self, oto_id: OtoOrderId) -> Result<Option<Fulfillment>, StoreError> {
        Ok(self
            .processor
            .process(GetFulfillmentByOrderSequence {
                order_id: oto_id.order_id,
                fulfillment_order: oto_id.fulfillment_order,
            })
            .await?)
    }

    async fn last_fulfillment(&self, order_id: i64) -> Result<Option<Fulfillment>, StoreError> {
        Ok(self
            .processor
            .process(GetLastOrderFulfillment { order_id })
            .await?)
    }

    async fn save_tracking(&self, fulfillment: &Fulfillment) -> Result<(), StoreError> {
        self.processor
            .process(UpdateFulfillmentTracking {
                fulfillment_id: fulfillment.id,
                tracking_number: fulfillment.tracking_number.clone(),
                metadata: fulfillment.metadata.0.clone(),
            })
            .await?;
        Ok(())
    }

    async fn save_fulfillment_metadata(&self, fulfillment: &Fulfillment) -> Result<(), StoreError> {
        self.processor
            .process(UpdateFulfillmentMetadata {
                fulfillment_id: fulfillment.id,
                metadata: fulfillment.metadata.0.clone(),
            })
            .await?;
        Ok(())
    }

    async fn order_metadata(&self, order_id: i64) -> Result<Option<Metadata>, StoreError> {
        let order = self.processor.process(GetOrderById { order_id }).await?;
        Ok(order.map(|order| order.metadata.0))
    }

    async fn save_order_metadata(
        &self,
        order_id: i64,
        metadata: Metadata,
    ) -> Result<(), StoreError> {
        self.processor
            .process(UpdateOrderMetadata { order_id, metadata })
            .await?;
        Ok(())
    }

    async fn service_account(&self, email: &str) -> Result<ServiceAccount, StoreError> {
        Ok(self
            .processor
            .process(GetOrCreateServiceAccount {
                email: email.to_owned(),
            })
            .await?)
    }

    async fn cancel_fulfillment(
        &self,
        fulfillment: &Fulfillment,
        actor: &ServiceAccount,
    ) -> Result<(), StoreError> {
        self.processor
            .process(CancelFulfillment {
                fulfillment_id: fulfillment.id,
                user_id: actor.id,
            })
            .await?;
        Ok(())
    }
}
