use crate::entities::Metadata;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use sqlx::types::Json;

/// Host order as read by the bridge.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    /// The linked user's email, or the guest checkout email.
    pub customer_email: String,
    /// `None` for guest checkouts.
    pub customer_full_name: Option<String>,
    pub shipping_address_id: Option<i64>,
    pub currency: String,
    pub checkout_token: Option<String>,
    pub customer_note: String,
    pub shipping_price_net_amount: Decimal,
    pub subtotal_net_amount: Decimal,
    pub total_gross_amount: Decimal,
    pub metadata: Json<Metadata>,
    pub created_at: time::OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShippingAddress {
    pub street_address_1: String,
    pub street_address_2: String,
    pub city: String,
    pub city_area: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub gateway: String,
    pub created_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct GetOrderById {
    pub order_id: i64,
}

impl Processor<GetOrderById> for DatabaseProcessor {
    type Output = Option<Order>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderById")]
    async fn process(&self, query: GetOrderById) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(
            r#"
            SELECT
                o.id,
                COALESCE(u.email, o.user_email) AS customer_email,
                CASE WHEN u.id IS NULL THEN NULL
                     ELSE TRIM(CONCAT(u.first_name, ' ', u.last_name))
                END AS customer_full_name,
                o.shipping_address_id,
                o.currency,
                o.checkout_token,
                o.customer_note,
                o.shipping_price_net_amount,
                o.subtotal_net_amount,
                o.total_gross_amount,
                o.metadata,
                o.created_at
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            WHERE o.id = $1
            "#,
        )
        .bind(query.order_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct GetShippingAddress {
    pub address_id: i64,
}

impl Processor<GetShippingAddress> for DatabaseProcessor {
    type Output = Option<ShippingAddress>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetShippingAddress")]
    async fn process(
        &self,
        query: GetShippingAddress,
    ) -> Result<Option<ShippingAddress>, sqlx::Error> {
        sqlx::query_as::<_, ShippingAddress>(
            r#"
            SELECT street_address_1, street_address_2, city, city_area,
                   postal_code, country_code, phone
            FROM addresses
            WHERE id = $1
            "#,
        )
        .bind(query.address_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// The most recent payment recorded for an order.
pub struct GetLastPayment {
    pub order_id: i64,
}

impl Processor<GetLastPayment> for DatabaseProcessor {
    type Output = Option<Payment>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetLastPayment")]
    async fn process(&self, query: GetLastPayment) -> Result<Option<Payment>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, order_id, gateway, created_at
            FROM payments
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(query.order_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Overwrite an order's metadata column.
pub struct UpdateOrderMetadata {
    pub order_id: i64,
    pub metadata: Metadata,
}

impl Processor<UpdateOrderMetadata> for DatabaseProcessor {
    type Output = ();
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateOrderMetadata")]
    async fn process(&self, cmd: UpdateOrderMetadata) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET metadata = $1 WHERE id = $2")
            .bind(Json(cmd.metadata))
            .bind(cmd.order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
