//! Outbound payloads for the OTO order endpoints.
//!
//! Pure mapping from host records to request bodies; nothing here touches
//! the database or the network.

use oto_sdk::objects::{
    CreateOrderRequest, Customer, OrderItem, OrderReference, PaymentMethod,
};
use rust_decimal::Decimal;

use crate::config::StoreProfile;
use crate::entities::fulfillments::{Fulfillment, FulfillmentLine};
use crate::entities::orders::{Order, Payment, ShippingAddress};
use crate::identifier::OtoOrderId;

/// Everything needed to describe one fulfillment to OTO.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentAggregate {
    pub fulfillment: Fulfillment,
    /// In insertion order; the last one prices `amount`.
    pub lines: Vec<FulfillmentLine>,
    pub order: Order,
    pub shipping_address: Option<ShippingAddress>,
    pub last_payment: Option<Payment>,
    /// How many fulfillments the order has in total.
    pub order_fulfillment_count: i64,
}

/// Errors from building an outbound payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("order {0} has no recorded payment")]
    MissingPayment(i64),
    #[error("fulfillment {0} has no lines")]
    EmptyFulfillment(String),
    #[error("order {0} has no shipping address")]
    MissingShippingAddress(i64),
    #[error("amount of fulfillment {0} overflows")]
    AmountOverflow(String),
}

/// Build the body of `createOrder` for a fulfillment.
///
/// Shipping is charged in full only when the fulfillment is the order's
/// sole one, so split shipments never bill it twice. `amount` is priced
/// from the last fulfillment line alone.
pub fn build_create_order_payload(
    aggregate: &FulfillmentAggregate,
    store: &StoreProfile,
) -> Result<CreateOrderRequest, PayloadError> {
    let FulfillmentAggregate {
        fulfillment,
        lines,
        order,
        shipping_address,
        last_payment,
        order_fulfillment_count,
    } = aggregate;

    let payment = last_payment
        .as_ref()
        .ok_or(PayloadError::MissingPayment(order.id))?;
    let last_line = lines
        .last()
        .ok_or_else(|| PayloadError::EmptyFulfillment(fulfillment.composed_id()))?;
    let address = shipping_address
        .as_ref()
        .ok_or(PayloadError::MissingShippingAddress(order.id))?;

    let payment_method = if store.is_cod_gateway(&payment.gateway) {
        PaymentMethod::Cod
    } else {
        PaymentMethod::Paid
    };
    let shipping_amount = if *order_fulfillment_count == 1 {
        order.shipping_price_net_amount
    } else {
        Decimal::ZERO
    };
    let amount = Decimal::from(last_line.quantity)
        .checked_mul(last_line.unit_price_net_amount)
        .ok_or_else(|| PayloadError::AmountOverflow(fulfillment.composed_id()))?;
    let amount_due = match payment_method {
        PaymentMethod::Cod => order.total_gross_amount,
        PaymentMethod::Paid => Decimal::ZERO,
    };

    Ok(CreateOrderRequest {
        store_name: store.name.clone(),
        shipping_amount,
        currency: order.currency.clone(),
        ref1: order.checkout_token.clone(),
        shipping_notes: Some(order.customer_note.clone()),
        payment_method,
        order_id: OtoOrderId::for_fulfillment(fulfillment).to_string(),
        items: lines.iter().map(|line| order_item(line, store)).collect(),
        customer: customer(order, address),
        subtotal: order.subtotal_net_amount,
        amount_due,
        amount,
        order_date: order_date(fulfillment.created_at),
    })
}

/// Build the body of `cancelOrder` (also used for `getReturnLink`).
pub fn build_cancel_order_payload(fulfillment: &Fulfillment) -> OrderReference {
    OrderReference {
        order_id: OtoOrderId::for_fulfillment(fulfillment).to_string(),
    }
}

fn order_item(line: &FulfillmentLine, store: &StoreProfile) -> OrderItem {
    OrderItem {
        quantity: line.quantity,
        sku: line.product_sku.clone(),
        name: line.product_name.clone(),
        product_id: line.variant_id,
        price: line.total_price_net_amount,
        image: line
            .image_path
            .as_deref()
            .map(|path| format!("{}{}", store.site_domain, path))
            .unwrap_or_default(),
    }
}

fn customer(order: &Order, address: &ShippingAddress) -> Customer {
    let street = if address.street_address_1.is_empty() {
        &address.street_address_2
    } else {
        &address.street_address_1
    };
    Customer {
        email: order.customer_email.clone(),
        country: address.country_code.clone(),
        postcode: address.postal_code.clone(),
        address: street.clone(),
        name: order.customer_full_name.clone().unwrap_or_default(),
        city: address.city.clone(),
        mobile: address.phone.clone(),
        district: address.city_area.clone(),
    }
}

/// `DD/MM/YYYY H:M`, hour and minute unpadded.
fn order_date(at: time::OffsetDateTime) -> String {
    format!(
        "{:02}/{:02}/{:04} {}:{}",
        at.day(),
        u8::from(at.month()),
        at.year(),
        at.hour(),
        at.minute()
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entities::FulfillmentStatus;
    use sqlx::types::Json;
    use time::macros::datetime;

    pub(crate) fn store_profile() -> StoreProfile {
        StoreProfile {
            name: "WeCre8".to_owned(),
            site_domain: "https://shop.example".to_owned(),
            cod_gateways: vec!["payments.cash".to_owned()],
        }
    }

    pub(crate) fn line(id: i64, quantity: i32, unit_price: Decimal) -> FulfillmentLine {
        FulfillmentLine {
            id,
            quantity,
            product_name: format!("Product {id}"),
            product_sku: Some(format!("SKU-{id}")),
            variant_id: Some(100 + id),
            image_path: None,
            unit_price_net_amount: unit_price,
            total_price_net_amount: unit_price * Decimal::from(quantity),
        }
    }

    pub(crate) fn aggregate(gateway: &str, fulfillment_count: i64) -> FulfillmentAggregate {
        FulfillmentAggregate {
            fulfillment: Fulfillment {
                id: 7,
                order_id: 42,
                fulfillment_order: 1,
                status: FulfillmentStatus::Fulfilled,
                tracking_number: String::new(),
                metadata: Json(Default::default()),
                created_at: datetime!(2024-01-02 09:05 UTC),
            },
            lines: vec![
                line(1, 2, Decimal::new(1000, 2)),
                line(2, 3, Decimal::new(2550, 2)),
            ],
            order: Order {
                id: 42,
                customer_email: "buyer@example.com".to_owned(),
                customer_full_name: Some("Sara Ali".to_owned()),
                shipping_address_id: Some(5),
                currency: "SAR".to_owned(),
                checkout_token: Some("chk-1".to_owned()),
                customer_note: "Call first".to_owned(),
                shipping_price_net_amount: Decimal::new(2500, 2),
                subtotal_net_amount: Decimal::new(9650, 2),
                total_gross_amount: Decimal::new(12150, 2),
                metadata: Json(Default::default()),
                created_at: datetime!(2024-01-01 08:00 UTC),
            },
            shipping_address: Some(ShippingAddress {
                street_address_1: "King Fahd Rd 1".to_owned(),
                street_address_2: "Unit 4".to_owned(),
                city: "Riyadh".to_owned(),
                city_area: "Olaya".to_owned(),
                postal_code: "12211".to_owned(),
                country_code: "SA".to_owned(),
                phone: "+966500000000".to_owned(),
            }),
            last_payment: Some(Payment {
                id: 3,
                order_id: 42,
                gateway: gateway.to_owned(),
                created_at: datetime!(2024-01-01 08:01 UTC),
            }),
            order_fulfillment_count: fulfillment_count,
        }
    }

    #[test]
    fn sole_fulfillment_carries_full_shipping() {
        let payload =
            build_create_order_payload(&aggregate("stripe", 1), &store_profile()).unwrap();
        assert_eq!(payload.shipping_amount, Decimal::new(2500, 2));
    }

    #[test]
    fn split_shipments_carry_no_shipping() {
        let mut first = aggregate("stripe", 2);
        let mut second = aggregate("stripe", 2);
        second.fulfillment.id = 8;
        second.fulfillment.fulfillment_order = 2;
        first.lines.truncate(1);

        for agg in [first, second] {
            let payload = build_create_order_payload(&agg, &store_profile()).unwrap();
            assert_eq!(payload.shipping_amount, Decimal::ZERO);
        }
    }

    #[test]
    fn cash_gateway_makes_cod_with_amount_due() {
        let payload =
            build_create_order_payload(&aggregate("payments.cash", 1), &store_profile()).unwrap();
        assert_eq!(payload.payment_method, PaymentMethod::Cod);
        assert_eq!(payload.amount_due, Decimal::new(12150, 2));
    }

    #[test]
    fn prepaid_order_has_nothing_due() {
        let payload =
            build_create_order_payload(&aggregate("stripe", 1), &store_profile()).unwrap();
        assert_eq!(payload.payment_method, PaymentMethod::Paid);
        assert_eq!(payload.amount_due, Decimal::ZERO);
    }

    #[test]
    fn amount_prices_only_the_last_line() {
        let payload =
            build_create_order_payload(&aggregate("stripe", 1), &store_profile()).unwrap();
        // 3 x 25.50, the first line is ignored.
        assert_eq!(payload.amount, Decimal::new(7650, 2));
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[1].price, Decimal::new(7650, 2));
        assert_eq!(payload.items[1].product_id, Some(102));
    }

    #[test]
    fn maps_order_and_customer_fields() {
        let mut agg = aggregate("stripe", 1);
        agg.lines[0].image_path = Some("/media/p1.png".to_owned());
        agg.shipping_address.as_mut().unwrap().street_address_1.clear();
        agg.order.customer_full_name = None;

        let payload = build_create_order_payload(&agg, &store_profile()).unwrap();
        assert_eq!(payload.store_name, "WeCre8");
        assert_eq!(payload.order_id, "#42-1");
        assert_eq!(payload.ref1.as_deref(), Some("chk-1"));
        assert_eq!(payload.shipping_notes.as_deref(), Some("Call first"));
        assert_eq!(payload.subtotal, Decimal::new(9650, 2));
        assert_eq!(payload.items[0].image, "https://shop.example/media/p1.png");
        assert_eq!(payload.items[1].image, "");
        assert_eq!(payload.customer.address, "Unit 4");
        assert_eq!(payload.customer.name, "");
        assert_eq!(payload.customer.district, "Olaya");
        assert_eq!(payload.customer.mobile, "+966500000000");
        assert_eq!(payload.customer.country, "SA");
    }

    #[test]
    fn order_date_leaves_hour_and_minute_unpadded() {
        assert_eq!(order_date(datetime!(2024-01-02 09:05 UTC)), "02/01/2024 9:5");
        assert_eq!(order_date(datetime!(2023-12-31 23:45 UTC)), "31/12/2023 23:45");
    }

    #[test]
    fn missing_payment_or_lines_fail() {
        let mut agg = aggregate("stripe", 1);
        agg.last_payment = None;
        assert_eq!(
            build_create_order_payload(&agg, &store_profile()),
            Err(PayloadError::MissingPayment(42))
        );

        let mut agg = aggregate("stripe", 1);
        agg.lines.clear();
        assert_eq!(
            build_create_order_payload(&agg, &store_profile()),
            Err(PayloadError::EmptyFulfillment("42-1".to_owned()))
        );

        let mut agg = aggregate("stripe", 1);
        agg.shipping_address = None;
        assert_eq!(
            build_create_order_payload(&agg, &store_profile()),
            Err(PayloadError::MissingShippingAddress(42))
        );
    }

    #[test]
    fn overflowing_amount_is_an_error() {
        let mut agg = aggregate("stripe", 1);
        agg.lines.push(FulfillmentLine {
            unit_price_net_amount: Decimal::MAX,
            total_price_net_amount: Decimal::MAX,
            ..line(3, 3, Decimal::ONE)
        });
        assert_eq!(
            build_create_order_payload(&agg, &store_profile()),
            Err(PayloadError::AmountOverflow("42-1".to_owned()))
        );
    }

    #[test]
    fn cancel_payload_holds_only_the_order_id() {
        let agg = aggregate("stripe", 1);
        let payload = build_cancel_order_payload(&agg.fulfillment);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({ "orderId": "#42-1" })
        );
    }
}
