use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::{
    classifier::Activity,
    domain::{find_customer, find_stock, Customer, Order, OrderId, Stock},
};

use crate::view::ViewMode;

pub const DEFAULT_PAGE_SIZE: usize = 10;
const UNKNOWN_CUSTOMER: &str = "Unknown customer";
const UNKNOWN_PRODUCT: &str = "Unknown product";
const NO_DATE: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub search: Option<String>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The one mutation offered per row: delete in the active list, restore in
/// the inactive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Delete,
    Restore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub order_id: OrderId,
    pub order_no: String,
    pub customer: String,
    pub order_date: String,
    pub total: String,
    pub tax: String,
    pub action: RowAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTable {
    pub title: &'static str,
    pub mode: ViewMode,
    pub rows: Vec<OrderRow>,
    pub page: usize,
    pub total_pages: usize,
    /// Rows matching the search, across all pages.
    pub matching: usize,
}

pub fn render_table(
    orders: &[Order],
    mode: ViewMode,
    customers: &[Customer],
    query: &TableQuery,
) -> OrderTable {
    let action = match mode {
        ViewMode::ShowingActive => RowAction::Delete,
        ViewMode::ShowingInactive => RowAction::Restore,
    };
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let matching: Vec<OrderRow> = orders
        .iter()
        .map(|order| OrderRow {
            order_id: order.order_id,
            order_no: order.order_no.clone(),
            customer: customer_name(customers, order),
            order_date: format_date(order.order_date.as_deref()),
            total: format_currency(order.total_price),
            tax: format_tax_rate(order.tax),
            action,
        })
        .filter(|row| match &needle {
            Some(needle) => row_matches(row, needle),
            None => true,
        })
        .collect();

    let page_size = query.page_size.max(1);
    let total_pages = matching.len().div_ceil(page_size).max(1);
    let page = query.page.clamp(1, total_pages);
    let count = matching.len();
    let rows = matching
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    OrderTable {
        title: mode.title(),
        mode,
        rows,
        page,
        total_pages,
        matching: count,
    }
}

fn row_matches(row: &OrderRow, needle: &str) -> bool {
    row.order_no.to_lowercase().contains(needle)
        || row.customer.to_lowercase().contains(needle)
        || row.order_id.to_string() == needle
}

fn customer_name(customers: &[Customer], order: &Order) -> String {
    order
        .customer_id
        .and_then(|id| find_customer(customers, id))
        .map(|customer| customer.customer_name.clone())
        .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub product: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetailsView {
    pub order_id: OrderId,
    pub order_no: String,
    pub customer: String,
    pub order_date: String,
    pub status: Activity,
    pub total: String,
    pub tax_rate: String,
    pub tax_amount: String,
    pub lines: Vec<DetailLine>,
}

pub fn render_details(order: &Order, customers: &[Customer], stocks: &[Stock]) -> OrderDetailsView {
    let lines = order
        .order_details
        .iter()
        .map(|detail| {
            let stock = find_stock(stocks, detail.stock_id);
            let price = stock.map(|stock| stock.price).unwrap_or_default();
            DetailLine {
                product: stock
                    .map(|stock| stock.stock_name.clone())
                    .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
                quantity: detail.amount,
                unit_price: format_currency(price),
                line_total: format_currency(price * f64::from(detail.amount)),
            }
        })
        .collect();

    OrderDetailsView {
        order_id: order.order_id,
        order_no: order.order_no.clone(),
        customer: customer_name(customers, order),
        order_date: format_date(order.order_date.as_deref()),
        status: order.activity,
        total: format_currency(order.total_price),
        tax_rate: format_tax_rate(order.tax),
        tax_amount: format_currency(order.tax_amount()),
        lines,
    }
}

/// Turkish lira, e.g. `₺1.234,56`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "₺0,00".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}₺{grouped},{fraction:02}")
}

/// `0.18` renders as `%18`.
pub fn format_tax_rate(tax: f64) -> String {
    format!("%{:.0}", tax * 100.0)
}

/// `dd.mm.yyyy hh:mm`; unparsable input is shown verbatim.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return NO_DATE.to_string();
    };

    parse_timestamp(raw)
        .map(|timestamp| timestamp.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.naive_local());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(timestamp);
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(timestamp);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
