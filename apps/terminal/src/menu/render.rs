//! Plain-text layouts for carts, receipts and listings.

use std::fmt::Write as _;

use crate::commands::cart::CartResponse;
use crate::commands::customer::CustomerDto;
use crate::commands::product::ProductDto;
use crate::commands::sale::{ReceiptResponse, SaleSummaryDto};
use crate::menu::App;

pub fn cart(app: &App, cart: &CartResponse) -> String {
    if cart.lines.is_empty() {
        return "Cart is empty.".to_string();
    }

    let mut out = String::new();
    for line in &cart.lines {
        let _ = writeln!(
            out,
            "{:>3}) {:<32} {:>4} x {:>10} = {:>10}",
            line.position,
            line.name,
            line.quantity,
            app.money(line.unit_price_cents),
            app.money(line.line_total_cents),
        );
    }
    let _ = write!(
        out,
        "     {} item(s), total {}",
        cart.total_quantity,
        app.money(cart.total_cents)
    );
    out
}

pub fn receipt(app: &App, receipt: &ReceiptResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {} ---", receipt.store_name);
    let _ = writeln!(out, "Sale {}", receipt.sale_id);
    let _ = writeln!(out, "{}  Customer: {}", receipt.timestamp, receipt.customer_name);
    for item in &receipt.items {
        let _ = write!(
            out,
            "  {:<32} {:>4} x {:>10} = {:>10}",
            item.name,
            item.quantity,
            app.money(item.unit_price_cents),
            app.money(item.line_total_cents),
        );
        if let Some(margin) = item.margin_cents {
            let _ = write!(out, "  (margin {})", app.money(margin));
        }
        out.push('\n');
    }
    let _ = write!(out, "  TOTAL {}", app.money(receipt.total_cents));
    if let Some(margin) = receipt.margin_cents {
        let _ = write!(out, "  (margin {})", app.money(margin));
    }
    out
}

/// Product list numbered from 1.
pub fn products(app: &App, products: &[ProductDto]) -> String {
    if products.is_empty() {
        return "No products found.".to_string();
    }
    products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{:>3}) {:<32} {:<14} {:>10}  stock {:>4}{}",
                i + 1,
                p.name,
                p.barcode.as_deref().unwrap_or("-"),
                app.money(p.price_cents),
                p.stock,
                if p.is_active { "" } else { "  (inactive)" },
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn customers(customers: &[CustomerDto]) -> String {
    if customers.is_empty() {
        return "No customers found.".to_string();
    }
    customers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{:>3}) {:<32} {:<28} {}",
                i + 1,
                c.name,
                c.email.as_deref().unwrap_or("-"),
                c.phone.as_deref().unwrap_or("-"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn sales(app: &App, sales: &[SaleSummaryDto]) -> String {
    if sales.is_empty() {
        return "No sales found.".to_string();
    }
    sales
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{:>3}) {}  {:<24} {:>3} item(s) {:>10}",
                i + 1,
                s.created_at,
                s.customer_name,
                s.item_count,
                app.money(s.total_cents),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
