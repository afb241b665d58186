//! In-memory [`FulfillmentStore`] for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{FulfillmentStore, StoreError};
use crate::entities::fulfillments::{Fulfillment, FulfillmentLine};
use crate::entities::orders::{Order, Payment, ShippingAddress};
use crate::entities::users::ServiceAccount;
use crate::entities::{FulfillmentStatus, Metadata};
use crate::identifier::OtoOrderId;
use crate::payload::FulfillmentAggregate;

#[derive(Debug, Default)]
struct Tables {
    orders: HashMap<i64, Order>,
    addresses: HashMap<i64, ShippingAddress>,
    payments: Vec<Payment>,
    fulfillments: HashMap<i64, Fulfillment>,
    lines: HashMap<i64, Vec<FulfillmentLine>>,
    users: Vec<ServiceAccount>,
    cancellations: Vec<(i64, i64)>,
    tracking_writes: usize,
}

/// Host tables kept in a mutex, with counters for asserting side effects.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_order(&self, order: Order, address: Option<ShippingAddress>) {
        let mut tables = self.tables();
        if let (Some(id), Some(address)) = (order.shipping_address_id, address) {
            tables.addresses.insert(id, address);
        }
        tables.orders.insert(order.id, order);
    }

    pub fn insert_payment(&self, payment: Payment) {
        self.tables().payments.push(payment);
    }

    pub fn insert_fulfillment(&self, fulfillment: Fulfillment, lines: Vec<FulfillmentLine>) {
        let mut tables = self.tables();
        tables.lines.insert(fulfillment.id, lines);
        tables.fulfillments.insert(fulfillment.id, fulfillment);
    }

    /// Seed every table from a payload aggregate.
    pub fn insert_aggregate(&self, aggregate: FulfillmentAggregate) {
        self.insert_order(aggregate.order, aggregate.shipping_address);
        if let Some(payment) = aggregate.last_payment {
            self.insert_payment(payment);
        }
        self.insert_fulfillment(aggregate.fulfillment, aggregate.lines);
    }

    pub fn fulfillment(&self, id: i64) -> Option<Fulfillment> {
        self.tables().fulfillments.get(&id).cloned()
    }

    pub fn order(&self, id: i64) -> Option<Order> {
        self.tables().orders.get(&id).cloned()
    }

    /// `(fulfillment_id, user_id)` for every cancellation action run.
    pub fn cancellations(&self) -> Vec<(i64, i64)> {
        self.tables().cancellations.clone()
    }

    /// How many times tracking fields were persisted.
    pub fn tracking_writes(&self) -> usize {
        self.tables().tracking_writes
    }
}

#[async_trait]
impl FulfillmentStore for MemoryStore {
    async fn load_aggregate(
        &self,
        fulfillment_id: i64,
    ) -> Result<Option<FulfillmentAggregate>, StoreError> {
        let tables = self.tables();
        let Some(fulfillment) = tables.fulfillments.get(&fulfillment_id).cloned() else {
            return Ok(None);
        };
        let Some(order) = tables.orders.get(&fulfillment.order_id).cloned() else {
            return Ok(None);
        };
        let shipping_address = order
            .shipping_address_id
            .and_then(|id| tables.addresses.get(&id).cloned());
        let last_payment = tables
            .payments
            .iter()
            .filter(|payment| payment.order_id == order.id)
            .max_by_key(|payment| (payment.created_at, payment.id))
            .cloned();
        let order_fulfillment_count = tables
            .fulfillments
            .values()
            .filter(|f| f.order_id == order.id)
            .count() as i64;
        let lines = tables
            .lines
            .get(&fulfillment_id)
            .cloned()
            .unwrap_or_default();

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
        Ok(self.fulfillment(fulfillment_id))
    }

    async fn find_by_oto_id(&self, oto_id: OtoOrderId) -> Result<Option<Fulfillment>, StoreError> {
        Ok(self
            .tables()
            .fulfillments
            .values()
            .find(|f| {
                f.order_id == oto_id.order_id && f.fulfillment_order == oto_id.fulfillment_order
            })
            .cloned())
    }

    async fn last_fulfillment(&self, order_id: i64) -> Result<Option<Fulfillment>, StoreError> {
        Ok(self
            .tables()
            .fulfillments
            .values()
            .filter(|f| f.order_id == order_id)
            .max_by_key(|f| f.id)
            .cloned())
    }

    async fn save_tracking(&self, fulfillment: &Fulfillment) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.tracking_writes += 1;
        if let Some(stored) = tables.fulfillments.get_mut(&fulfillment.id) {
            stored.tracking_number = fulfillment.tracking_number.clone();
            stored.metadata = fulfillment.metadata.clone();
        }
        Ok(())
    }

    async fn save_fulfillment_metadata(&self, fulfillment: &Fulfillment) -> Result<(), StoreError> {
        if let Some(stored) = self.tables().fulfillments.get_mut(&fulfillment.id) {
            stored.metadata = fulfillment.metadata.clone();
        }
        Ok(())
    }

    async fn order_metadata(&self, order_id: i64) -> Result<Option<Metadata>, StoreError> {
        Ok(self
            .tables()
            .orders
            .get(&order_id)
            .map(|order| order.metadata.0.clone()))
    }

    async fn save_order_metadata(
        &self,
        order_id: i64,
        metadata: Metadata,
    ) -> Result<(), StoreError> {
        if let Some(order) = self.tables().orders.get_mut(&order_id) {
            order.metadata.0 = metadata;
        }
        Ok(())
    }

    async fn service_account(&self, email: &str) -> Result<ServiceAccount, StoreError> {
        let mut tables = self.tables();
        if let Some(user) = tables.users.iter().find(|user| user.email == email) {
            return Ok(user.clone());
        }
        let user = ServiceAccount {
            id: tables.users.len() as i64 + 1,
            email: email.to_owned(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn cancel_fulfillment(
        &self,
        fulfillment: &Fulfillment,
        actor: &ServiceAccount,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.cancellations.push((fulfillment.id, actor.id));
        if let Some(stored) = tables.fulfillments.get_mut(&fulfillment.id) {
            stored.status = FulfillmentStatus::Canceled;
        }
        Ok(())
    }
}
