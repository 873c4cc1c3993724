//! # Stock Ledger
//!
//! How much of a product can still be put in the cart, and the write-back
//! of sold quantities at checkout.
//!
//! ```text
//! available = stock on record − quantity of matching lines in the cart
//!
//!   stock on record:  variation.stock_quantity        (variation selected)
//!                     product.stock_quantity          (plain product)
//!                     MAX_ITEM_QUANTITY               (untracked product)
//!                     0                               (unknown id)
//! ```

use tracing::warn;

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::order::OrderItem;
use crate::MAX_ITEM_QUANTITY;

/// Stock on record for a product or one of its variations.
///
/// Unknown products and variations have nothing on record.
pub fn stock_on_record(catalog: &Catalog, product_id: &str, variation_id: Option<&str>) -> i64 {
    let Some(product) = catalog.get(product_id) else {
        return 0;
    };
    match variation_id {
        Some(vid) => product.variation(vid).map_or(0, |v| v.stock_quantity),
        None => product.stock_quantity.unwrap_or(MAX_ITEM_QUANTITY),
    }
}

/// Stock still purchasable, net of what the cart already holds. Never
/// negative.
pub fn available_stock(
    catalog: &Catalog,
    cart: &Cart,
    product_id: &str,
    variation_id: Option<&str>,
) -> i64 {
    let on_record = stock_on_record(catalog, product_id, variation_id);
    (on_record - cart.reserved_quantity(product_id, variation_id)).max(0)
}

/// Decrements stock on record for each sold line.
///
/// Lines are applied one at a time. A line whose product has left the
/// catalog is skipped and the rest are still applied; there is no rollback.
/// Untracked products are left alone.
pub fn decrement(catalog: &mut Catalog, items: &[OrderItem]) {
    for item in items {
        let Some(product) = catalog.get(&item.product_id) else {
            warn!(product_id = %item.product_id, "sold product missing from catalog, stock not updated");
            continue;
        };
        let current = match item.variation_id.as_deref() {
            Some(vid) => match product.variation(vid) {
                Some(v) => v.stock_quantity,
                None => {
                    warn!(product_id = %item.product_id, variation_id = vid, "sold variation missing, stock not updated");
                    continue;
                }
            },
            None => match product.stock_quantity {
                Some(q) => q,
                None => continue,
            },
        };
        // ids were just resolved, so the write cannot miss
        if let Err(err) = catalog.set_stock(
            &item.product_id,
            item.variation_id.as_deref(),
            current - item.quantity,
        ) {
            warn!(error = %err, "stock write-back failed");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
