//! Plain-text receipt rendering.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Corner Cafe                │
//! │               12 Main St                 │
//! │                                          │
//! │ Order #7                   Takeout       │
//! │ 2026-10-19 14:02                         │
//! │ ---------------------------------------- │
//! │ 2 x Burger                        $20.00 │
//! │   + Cheese                               │
//! │ ---------------------------------------- │
//! │ Subtotal                          $20.00 │
//! │ Tax (8.00%)                        $1.60 │
//! │ TOTAL                             $21.60 │
//! │ Cash                              $21.60 │
//! │ Change                             $3.40 │
//! └──────────────────────────────────────────┘
//! ```

use aura_core::{Order, OrderStatus};

use crate::config::RegisterConfig;

pub fn render_receipt(order: &Order, config: &RegisterConfig) -> String {
    let width = config.paper_width();
    let money = |m: aura_core::Money| config.format_currency(m.cents());
    let rule = "-".repeat(width);
    let mut out = Vec::new();

    out.push(center(&config.store_name, width));
    if let Some(address) = &config.store_address {
        out.push(center(address, width));
    }
    if order.is_training {
        out.push(center("*** TRAINING ***", width));
    }
    if order.status == OrderStatus::Returned {
        out.push(center("*** RETURN ***", width));
    }
    out.push(String::new());

    out.push(two_col(
        &format!("Order #{}", order.order_number),
        order.order_type.label(),
        width,
    ));
    out.push(order.created_at.format("%Y-%m-%d %H:%M").to_string());
    out.push(rule.clone());

    for item in &order.items {
        out.push(two_col(
            &format!("{} x {}", item.quantity, item.name),
            &money(item.line_total),
            width,
        ));
        for modifier in &item.modifiers {
            let label = if modifier.quantity > 1 {
                format!("  + {} x{}", modifier.name, modifier.quantity)
            } else {
                format!("  + {}", modifier.name)
            };
            out.push(label);
        }
    }
    out.push(rule.clone());

    out.push(two_col("Subtotal", &money(order.subtotal), width));
    if !order.discount.is_zero() {
        out.push(two_col("Discount", &money(-order.discount), width));
    }
    out.push(two_col(
        &format!("Tax ({:.2}%)", order.tax_rate.percentage()),
        &money(order.tax),
        width,
    ));
    if !order.tip.is_zero() {
        out.push(two_col("Tip", &money(order.tip), width));
    }
    out.push(two_col("TOTAL", &money(order.total), width));

    for payment in &order.payments {
        let label = match &payment.card_last4 {
            Some(last4) => format!("{} ****{}", payment.method.label(), last4),
            None => payment.method.label().to_string(),
        };
        out.push(two_col(&label, &money(payment.amount), width));
        if let Some(change) = payment.change.filter(|c| c.is_positive()) {
            out.push(two_col("Change", &money(change), width));
        }
    }

    if let Some(notes) = &order.notes {
        out.push(String::new());
        out.push(notes.clone());
    }
    out.push(String::new());
    out.push(center("Thank you!", width));

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((width - len) / 2), text)
}

/// Left text and right-aligned amount on one line. Long names are cut so
/// the amount always fits.
fn two_col(left: &str, right: &str, width: usize) -> String {
    let right_len = right.chars().count();
    let room = width.saturating_sub(right_len + 1);
    let left: String = left.chars().take(room).collect();
    let pad = width.saturating_sub(left.chars().count() + right_len);
    format!("{}{}{}", left, " ".repeat(pad), right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aura_core::{CheckoutRequest, Money, PaymentLine, PosStore};

    fn paid_order(store: &mut PosStore) -> Order {
        store.add_item("burger", None, Vec::new()).unwrap();
        store
            .checkout(CheckoutRequest::new(vec![PaymentLine::cash(
                Money::from_cents(1_080),
                Money::from_cents(2_000),
            )]))
            .unwrap()
    }

    #[test]
    fn test_two_col_alignment() {
        assert_eq!(two_col("Tax", "$1.00", 12), "Tax    $1.00");
        assert_eq!(two_col("A very long product name", "$1.00", 12), "A very $1.00");
    }

    #[test]
    fn test_receipt_contents() {
        let mut store = crate::register::fixtures::open_store();
        let order = paid_order(&mut store);
        let config = RegisterConfig {
            store_name: "Corner Cafe".into(),
            ..RegisterConfig::default()
        };

        let text = render_receipt(&order, &config);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with("Corner Cafe"));
        assert!(text.contains(&format!("Order #{}", order.order_number)));
        assert!(text.contains("1 x Burger"));
        assert!(text.contains("Tax (8.00%)"));
        assert!(lines.iter().any(|l| l.starts_with("TOTAL") && l.ends_with("$10.80")));
        assert!(lines.iter().any(|l| l.starts_with("Change") && l.ends_with("$9.20")));
        assert!(lines.iter().all(|l| l.chars().count() <= 42));
        assert!(!text.contains("TRAINING"));
    }
}
