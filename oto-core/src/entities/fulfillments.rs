use crate::entities::{FulfillmentStatus, Metadata};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::types::Json;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Fulfillment {
    pub id: i64,
    pub order_id: i64,
    /// Per-order sequence number of this fulfillment.
    pub fulfillment_order: i32,
    pub status: FulfillmentStatus,
    pub tracking_number: String,
    pub metadata: Json<Metadata>,
    pub created_at: time::OffsetDateTime,
}

impl Fulfillment {
    /// `{order_id}-{fulfillment_order}`, the host's human-facing id.
    pub fn composed_id(&self) -> String {
        format!("{}-{}", self.order_id, self.fulfillment_order)
    }
}

/// A fulfillment line joined with the order line it ships.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FulfillmentLine {
    pub id: i64,
    pub quantity: i32,
    pub product_name: String,
    pub product_sku: Option<String>,
    pub variant_id: Option<i64>,
    pub image_path: Option<String>,
    pub unit_price_net_amount: Decimal,
    pub total_price_net_amount: Decimal,
}

const FULFILLMENT_COLUMNS: &str =
    "id, order_id, fulfillment_order, status, tracking_number, metadata, created_at";

#[derive(Debug, Clone)]
pub struct GetFulfillmentById {
    pub fulfillment_id: i64,
}

impl Processor<GetFulfillmentById> for DatabaseProcessor {
    type Output = Option<Fulfillment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetFulfillmentById")]
    async fn process(&self, query: GetFulfillmentById) -> Result<Option<Fulfillment>, sqlx::Error> {
        sqlx::query_as::<_, Fulfillment>(&format!(
            "SELECT {FULFILLMENT_COLUMNS} FROM fulfillments WHERE id = $1"
        ))
        .bind(query.fulfillment_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Look a fulfillment up by the pair embedded in the OTO order id.
pub struct GetFulfillmentByOrderSequence {
    pub order_id: i64,
    pub fulfillment_order: i32,
}

impl Processor<GetFulfillmentByOrderSequence> for DatabaseProcessor {
    type Output = Option<Fulfillment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetFulfillmentByOrderSequence")]
    async fn process(
        &self,
        query: GetFulfillmentByOrderSequence,
    ) -> Result<Option<Fulfillment>, sqlx::Error> {
        sqlx::query_as::<_, Fulfillment>(&format!(
            "SELECT {FULFILLMENT_COLUMNS} FROM fulfillments \
             WHERE order_id = $1 AND fulfillment_order = $2"
        ))
        .bind(query.order_id)
        .bind(query.fulfillment_order)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// The fulfillment with the highest id for an order.
pub struct GetLastOrderFulfillment {
    pub order_id: i64,
}

impl Processor<GetLastOrderFulfillment> for DatabaseProcessor {
    type Output = Option<Fulfillment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLastOrderFulfillment")]
    async fn process(
        &self,
        query: GetLastOrderFulfillment,
    ) -> Result<Option<Fulfillment>, sqlx::Error> {
        sqlx::query_as::<_, Fulfillment>(&format!(
            "SELECT {FULFILLMENT_COLUMNS} FROM fulfillments \
             WHERE order_id = $1 ORDER BY id DESC LIMIT 1"
        ))
        .bind(query.order_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct CountOrderFulfillments {
    pub order_id: i64,
}

impl Processor<CountOrderFulfillments> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CountOrderFulfillments")]
    async fn process(&self, query: CountOrderFulfillments) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM fulfillments WHERE order_id = $1")
            .bind(query.order_id)
            .fetch_one(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Lines of a fulfillment in insertion order.
pub struct GetFulfillmentLines {
    pub fulfillment_id: i64,
}

impl Processor<GetFulfillmentLines> for DatabaseProcessor {
    type Output = Vec<FulfillmentLine>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetFulfillmentLines")]
    async fn process(
        &self,
        query: GetFulfillmentLines,
    ) -> Result<Vec<FulfillmentLine>, sqlx::Error> {
        sqlx::query_as::<_, FulfillmentLine>(
            r#"
            SELECT
                fl.id,
                fl.quantity,
                ol.product_name,
                ol.product_sku,
                ol.variant_id,
                ol.image_path,
                ol.unit_price_net_amount,
                ol.total_price_net_amount
            FROM fulfillment_lines fl
            JOIN order_lines ol ON ol.id = fl.order_line_id
            WHERE fl.fulfillment_id = $1
            ORDER BY fl.id ASC
            "#,
        )
        .bind(query.fulfillment_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Persist the two fields a tracking webhook touches.
pub struct UpdateFulfillmentTracking {
    pub fulfillment_id: i64,
    pub tracking_number: String,
    pub metadata: Metadata,
}

impl Processor<UpdateFulfillmentTracking> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateFulfillmentTracking")]
    async fn process(&self, cmd: UpdateFulfillmentTracking) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE fulfillments SET tracking_number = $1, metadata = $2 WHERE id = $3")
            .bind(cmd.tracking_number)
            .bind(Json(cmd.metadata))
            .bind(cmd.fulfillment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UpdateFulfillmentMetadata {
    pub fulfillment_id: i64,
    pub metadata: Metadata,
}

impl Processor<UpdateFulfillmentMetadata> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateFulfillmentMetadata")]
    async fn process(&self, cmd: UpdateFulfillmentMetadata) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE fulfillments SET metadata = $1 WHERE id = $2")
            .bind(Json(cmd.metadata))
            .bind(cmd.fulfillment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// The host's fulfillment-cancellation action.
///
/// Marks the fulfillment canceled and records who did it, in one
/// transaction. No warehouse is involved, so nothing is restocked.
pub struct CancelFulfillment {
    pub fulfillment_id: i64,
    pub user_id: i64,
}

impl Processor<CancelFulfillment> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CancelFulfillment")]
    async fn process(&self, cmd: CancelFulfillment) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE fulfillments SET status = $1 WHERE id = $2")
            .bind(FulfillmentStatus::Canceled)
            .bind(cmd.fulfillment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO fulfillment_events (fulfillment_id, kind, user_id) \
             VALUES ($1, 'canceled', $2)",
        )
        .bind(cmd.fulfillment_id)
        .bind(cmd.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }
}
