use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::classifier::Activity;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(OrderId);
id_newtype!(OrderDetailId);
id_newtype!(CustomerId);
id_newtype!(StockId);
id_newtype!(AddressId);

/// Backend fields occasionally arrive as `null`; treat that like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An order as the backend stores it.
///
/// Fields the client does not model are kept in `extra` so a full-replace
/// update resends them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax: f64,
    #[serde(rename = "isActive", default)]
    pub activity: Activity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address_id: Option<AddressId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_address_id: Option<AddressId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_details: Vec<OrderDetail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    /// Copy of this record with only the activity flag replaced.
    pub fn with_activity(&self, activity: Activity) -> Self {
        Self {
            activity,
            ..self.clone()
        }
    }

    /// Tax portion already contained in `total_price`.
    pub fn tax_amount(&self) -> f64 {
        if self.tax <= -1.0 {
            return 0.0;
        }
        self.total_price - self.total_price / (1.0 + self.tax)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_detail_id: Option<OrderDetailId>,
    pub stock_id: StockId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: CustomerId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub stock_id: StockId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stock_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Supplementary address data; the schema is owned by the backend, so only
/// the identifiers are typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CustomerAddress {
    /// Non-empty text fields joined for single-line display.
    pub fn display_line(&self) -> String {
        self.fields
            .values()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn find_customer(customers: &[Customer], customer_id: CustomerId) -> Option<&Customer> {
    customers
        .iter()
        .find(|customer| customer.customer_id == customer_id)
}

pub fn find_stock(stocks: &[Stock], stock_id: StockId) -> Option<&Stock> {
    stocks.iter().find(|stock| stock.stock_id == stock_id)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_unmodelled_fields_for_full_replace() {
        let raw = json!({
            "orderId": 4,
            "orderNo": "A-104",
            "customerId": 2,
            "orderDate": "2024-03-01T10:15:00",
            "totalPrice": 118.0,
            "tax": 0.18,
            "isActive": "1",
            "deliveryAddressId": 7,
            "invoiceAddressId": 8,
            "createdBy": "seed",
            "orderDetails": [
                { "orderDetailId": 11, "stockId": 3, "amount": 2, "warehouse": "north" }
            ]
        });

        let order: Order = serde_json::from_value(raw).expect("order");
        assert_eq!(order.extra.get("createdBy"), Some(&json!("seed")));
        assert_eq!(
            order.order_details[0].extra.get("warehouse"),
            Some(&json!("north"))
        );

        let resent = serde_json::to_value(order.with_activity(Activity::Inactive)).expect("json");
        assert_eq!(resent["isActive"], json!(false));
        assert_eq!(resent["createdBy"], json!("seed"));
        assert_eq!(resent["orderDate"], json!("2024-03-01T10:15:00"));
        assert_eq!(resent["deliveryAddressId"], json!(7));
        assert_eq!(resent["orderDetails"][0]["orderDetailId"], json!(11));
        assert_eq!(resent["orderDetails"][0]["warehouse"], json!("north"));
    }

    #[test]
    fn tolerates_null_scalars() {
        let order: Order = serde_json::from_value(json!({
            "orderId": 1,
            "orderNo": null,
            "totalPrice": null,
            "orderDetails": null
        }))
        .expect("order");
        assert_eq!(order.order_no, "");
        assert_eq!(order.total_price, 0.0);
        assert!(order.order_details.is_empty());
        assert!(order.activity.is_active());
    }

    #[test]
    fn tax_amount_is_extracted_from_gross_total() {
        let order: Order = serde_json::from_value(json!({
            "orderId": 1,
            "totalPrice": 118.0,
            "tax": 0.18
        }))
        .expect("order");
        assert!((order.tax_amount() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn address_display_line_skips_blank_fields() {
        let address: CustomerAddress = serde_json::from_value(json!({
            "addressId": 1,
            "city": "Izmir",
            "line1": " Kordon 5 ",
            "note": "",
            "zip": 35000
        }))
        .expect("address");
        assert_eq!(address.display_line(), "Izmir, Kordon 5");
    }
}
