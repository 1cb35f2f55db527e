use serde::{Deserialize, Serialize};

use crate::domain::{AddressId, CustomerId, StockId};

/// Body of `POST /Orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub order_no: String,
    pub tax: f64,
    pub total_price: f64,
    pub delivery_address_id: AddressId,
    pub invoice_address_id: AddressId,
    pub order_details: Vec<CreateOrderLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderLine {
    pub stock_id: StockId,
    pub amount: u32,
}
