use client_core::{
    render::format_currency, OrderDetailsView, OrderTable, RowAction, ViewEvent,
};
use shared::domain::{Customer, CustomerAddress, Order, Stock};

pub fn print_table(table: &OrderTable) {
    println!(
        "{} ({} matching, page {}/{})",
        table.title, table.matching, table.page, table.total_pages
    );
    if table.rows.is_empty() {
        println!("  no orders");
        return;
    }

    println!(
        "{:>6}  {:<14} {:<24} {:<17} {:>14} {:>5}  action",
        "id", "order no", "customer", "date", "total", "tax"
    );
    for row in &table.rows {
        println!(
            "{:>6}  {:<14} {:<24} {:<17} {:>14} {:>5}  {}",
            row.order_id.0,
            row.order_no,
            row.customer,
            row.order_date,
            row.total,
            row.tax,
            action_label(row.action)
        );
    }
}

fn action_label(action: RowAction) -> &'static str {
    match action {
        RowAction::Delete => "delete",
        RowAction::Restore => "restore",
    }
}

pub fn print_details(details: &OrderDetailsView) {
    println!("Order {} (#{})", details.order_no, details.order_id);
    println!("  customer: {}", details.customer);
    println!("  date:     {}", details.order_date);
    println!("  status:   {}", details.status.label());
    println!("  tax:      {} ({})", details.tax_rate, details.tax_amount);
    println!("  total:    {}", details.total);

    if details.lines.is_empty() {
        println!("  no line items");
        return;
    }
    println!("  {:<24} {:>5} {:>14} {:>14}", "product", "qty", "unit", "line");
    for line in &details.lines {
        println!(
            "  {:<24} {:>5} {:>14} {:>14}",
            line.product, line.quantity, line.unit_price, line.line_total
        );
    }
}

pub fn print_created(order: Option<&Order>) {
    match order {
        Some(order) => println!(
            "created order {} (#{}) total {}",
            order.order_no,
            order.order_id,
            format_currency(order.total_price)
        ),
        None => println!("order created"),
    }
}

pub fn print_customers(customers: &[Customer]) {
    for customer in customers {
        println!("{:>6}  {}", customer.customer_id.0, customer.customer_name);
    }
}

pub fn print_stocks(stocks: &[Stock]) {
    for stock in stocks {
        println!(
            "{:>6}  {:<24} {:>14}",
            stock.stock_id.0,
            stock.stock_name,
            format_currency(stock.price)
        );
    }
}

pub fn print_addresses(addresses: &[CustomerAddress]) {
    if addresses.is_empty() {
        println!("no addresses on file");
        return;
    }
    for address in addresses {
        let id = address
            .address_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{id:>6}  {}", address.display_line());
    }
}

/// Prints notices the controller published; errors are reported by the caller.
pub fn print_notices(events: &mut tokio::sync::broadcast::Receiver<ViewEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ViewEvent::Notice(message) = event {
            println!("{message}");
        }
    }
}
