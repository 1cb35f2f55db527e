use serde_json::Value;
use thiserror::Error;

use crate::domain::StockId;

/// Reasons an order draft is rejected before it reaches the backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("a customer must be selected")]
    MissingCustomer,
    #[error("order number must not be empty")]
    MissingOrderNo,
    #[error("at least one line item is required")]
    EmptyLineItems,
    #[error("line item {index} references unknown stock {stock_id}")]
    UnknownStock { index: usize, stock_id: StockId },
    #[error("tax rate must be between 0 and 100 percent, got {0}")]
    TaxRateOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("unrecognized isActive value: {raw}")]
pub struct UnrecognizedActivityFlag {
    pub raw: Value,
}
