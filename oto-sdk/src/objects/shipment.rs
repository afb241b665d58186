//! Request bodies sent to the OTO order endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the consignee pays for the shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery: the carrier collects `amount_due`.
    Cod,
    Paid,
}

/// Body of `POST createOrder`.
///
/// Monetary amounts go over the wire as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "storeName")]
    pub store_name: String,
    #[serde(rename = "shippingAmount", with = "rust_decimal::serde::float")]
    pub shipping_amount: Decimal,
    pub currency: String,
    pub ref1: Option<String>,
    #[serde(rename = "shippingNotes")]
    pub shipping_notes: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub items: Vec<OrderItem>,
    pub customer: Customer,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_due: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "orderDate")]
    pub order_date: String,
}

/// One shipped line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub quantity: i32,
    pub sku: Option<String>,
    pub name: String,
    #[serde(rename = "productId")]
    pub product_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
}

/// Consignee contact and address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub email: String,
    pub country: String,
    pub postcode: String,
    pub address: String,
    pub name: String,
    pub city: String,
    pub mobile: String,
    pub district: String,
}

/// Body of `POST cancelOrder` and `POST getReturnLink`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderReference {
    #[serde(rename = "orderId")]
    pub order_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_uses_provider_field_names() {
        let request = CreateOrderRequest {
            store_name: "Store".to_owned(),
            shipping_amount: Decimal::new(1500, 2),
            currency: "SAR".to_owned(),
            ref1: None,
            shipping_notes: Some("leave at door".to_owned()),
            payment_method: PaymentMethod::Cod,
            order_id: "#1-1".to_owned(),
            items: vec![],
            customer: Customer::default(),
            subtotal: Decimal::new(10000, 2),
            amount_due: Decimal::new(11500, 2),
            amount: Decimal::new(5000, 2),
            order_date: "02/01/2024 9:5".to_owned(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["storeName"], "Store");
        assert_eq!(json["shippingAmount"], 15.0);
        assert_eq!(json["payment_method"], "cod");
        assert_eq!(json["orderId"], "#1-1");
        assert_eq!(json["amount_due"], 115.0);
        assert_eq!(json["orderDate"], "02/01/2024 9:5");
        assert!(json["ref1"].is_null());
    }
}
