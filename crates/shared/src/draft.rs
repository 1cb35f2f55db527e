use crate::{
    domain::{find_stock, AddressId, CustomerId, Stock, StockId},
    error::ValidationError,
    protocol::{CreateOrderLine, CreateOrderRequest},
};

pub const DEFAULT_TAX_RATE_PERCENT: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraftLine {
    pub stock_id: StockId,
    pub quantity: u32,
}

impl DraftLine {
    /// Unselected products and zero quantities are ignored, like blank form rows.
    fn is_filled(&self) -> bool {
        self.stock_id.0 > 0 && self.quantity > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: Option<CustomerId>,
    pub order_no: String,
    pub tax_rate_percent: f64,
    pub lines: Vec<DraftLine>,
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self {
            customer_id: None,
            order_no: String::new(),
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            lines: Vec::new(),
        }
    }
}

impl OrderDraft {
    pub fn new(customer_id: CustomerId, order_no: impl Into<String>) -> Self {
        Self {
            customer_id: Some(customer_id),
            order_no: order_no.into(),
            ..Self::default()
        }
    }

    pub fn with_tax_rate(mut self, tax_rate_percent: f64) -> Self {
        self.tax_rate_percent = tax_rate_percent;
        self
    }

    pub fn with_line(mut self, stock_id: StockId, quantity: u32) -> Self {
        self.lines.push(DraftLine { stock_id, quantity });
        self
    }

    fn filled_lines(&self) -> impl Iterator<Item = &DraftLine> {
        self.lines.iter().filter(|line| line.is_filled())
    }

    /// Sum of quantity times catalog price; unknown stock counts as zero.
    pub fn subtotal(&self, stocks: &[Stock]) -> f64 {
        self.filled_lines()
            .map(|line| {
                let price = find_stock(stocks, line.stock_id)
                    .map(|stock| stock.price)
                    .unwrap_or_default();
                f64::from(line.quantity) * price
            })
            .sum()
    }

    /// Gross total including tax, rounded to cents.
    pub fn total(&self, stocks: &[Stock]) -> f64 {
        let subtotal = self.subtotal(stocks);
        round_cents(subtotal + subtotal * (self.tax_rate_percent / 100.0))
    }

    /// Checks that need no catalog data.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.customer_id.is_none() {
            return Err(ValidationError::MissingCustomer);
        }
        if self.order_no.trim().is_empty() {
            return Err(ValidationError::MissingOrderNo);
        }
        if !(0.0..=100.0).contains(&self.tax_rate_percent) {
            return Err(ValidationError::TaxRateOutOfRange(self.tax_rate_percent));
        }
        if self.filled_lines().next().is_none() {
            return Err(ValidationError::EmptyLineItems);
        }
        Ok(())
    }

    /// Validates against the stock catalog and produces the create payload.
    pub fn build(&self, stocks: &[Stock]) -> Result<CreateOrderRequest, ValidationError> {
        self.validate()?;
        let customer_id = self.customer_id.ok_or(ValidationError::MissingCustomer)?;

        let mut order_details = Vec::new();
        for (index, line) in self.lines.iter().enumerate() {
            if !line.is_filled() {
                continue;
            }
            if find_stock(stocks, line.stock_id).is_none() {
                return Err(ValidationError::UnknownStock {
                    index,
                    stock_id: line.stock_id,
                });
            }
            order_details.push(CreateOrderLine {
                stock_id: line.stock_id,
                amount: line.quantity,
            });
        }

        // The panel has no address picker; the backend keys default addresses by customer.
        let address_id = AddressId(customer_id.0);
        Ok(CreateOrderRequest {
            customer_id,
            order_no: self.order_no.trim().to_string(),
            tax: self.tax_rate_percent / 100.0,
            total_price: self.total(stocks),
            delivery_address_id: address_id,
            invoice_address_id: address_id,
            order_details,
        })
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn stock(id: i64, price: f64) -> Stock {
        Stock {
            stock_id: StockId(id),
            stock_name: format!("stock-{id}"),
            price,
            extra: Map::new(),
        }
    }

    #[test]
    fn computes_gross_total_with_default_rate() {
        let stocks = vec![stock(1, 10.0), stock(2, 2.5)];
        let draft = OrderDraft::new(CustomerId(3), "A-1")
            .with_line(StockId(1), 2)
            .with_line(StockId(2), 4);

        assert_eq!(draft.subtotal(&stocks), 30.0);
        assert_eq!(draft.total(&stocks), 35.4);
    }

    #[test]
    fn builds_payload_with_fractional_tax() {
        let stocks = vec![stock(1, 10.0)];
        let request = OrderDraft::new(CustomerId(3), "  A-1 ")
            .with_tax_rate(8.0)
            .with_line(StockId(1), 1)
            .with_line(StockId(1), 0)
            .build(&stocks)
            .expect("payload");

        assert_eq!(request.order_no, "A-1");
        assert!((request.tax - 0.08).abs() < 1e-12);
        assert_eq!(request.total_price, 10.8);
        assert_eq!(request.order_details.len(), 1);
        assert_eq!(request.delivery_address_id, AddressId(3));
        assert_eq!(request.invoice_address_id, AddressId(3));
    }

    #[test]
    fn rejects_draft_without_line_items() {
        let draft = OrderDraft::new(CustomerId(1), "A-1").with_line(StockId(1), 0);
        assert_eq!(draft.validate(), Err(ValidationError::EmptyLineItems));
    }

    #[test]
    fn rejects_missing_customer_and_blank_order_no() {
        let mut draft = OrderDraft::default().with_line(StockId(1), 1);
        assert_eq!(draft.validate(), Err(ValidationError::MissingCustomer));

        draft.customer_id = Some(CustomerId(1));
        draft.order_no = "   ".into();
        assert_eq!(draft.validate(), Err(ValidationError::MissingOrderNo));
    }

    #[test]
    fn rejects_out_of_range_tax_rate() {
        let draft = OrderDraft::new(CustomerId(1), "A-1")
            .with_tax_rate(120.0)
            .with_line(StockId(1), 1);
        assert_eq!(
            draft.validate(),
            Err(ValidationError::TaxRateOutOfRange(120.0))
        );
    }

    #[test]
    fn rejects_unknown_stock() {
        let err = OrderDraft::new(CustomerId(1), "A-1")
            .with_line(StockId(1), 1)
            .with_line(StockId(99), 1)
            .build(&[stock(1, 1.0)])
            .expect_err("unknown stock");
        assert_eq!(
            err,
            ValidationError::UnknownStock {
                index: 1,
                stock_id: StockId(99)
            }
        );
    }
}
