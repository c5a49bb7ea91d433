//! Cart quantity rules and totals.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Money;

/// Maximum units of a single product/variant per cart line.
pub const MAX_QTY_PER_LINE: i32 = 10;

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 499;

/// Shipping charged below [`FREE_SHIPPING_THRESHOLD`].
pub const FLAT_SHIPPING_FEE: i64 = 49;

/// Pricing inputs for one cart line.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub unit_price: Money,
    pub unit_mrp: Option<Money>,
    pub quantity: i32,
}

/// Totals shown on the cart page and persisted on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub item_count: i32,
    pub subtotal: Money,
    pub mrp_total: Money,
    pub savings: Money,
    pub shipping: Money,
    pub total: Money,
}

/// Check a requested line quantity against the per-line cap and stock.
pub fn check_quantity(quantity: i32, available_stock: i32) -> Result<(), CoreError> {
    if quantity < 1 {
        return Err(CoreError::Validation(
            "quantity: must be at least 1".into(),
        ));
    }
    if quantity > MAX_QTY_PER_LINE {
        return Err(CoreError::Validation(format!(
            "quantity: at most {MAX_QTY_PER_LINE} units per item"
        )));
    }
    if quantity > available_stock {
        return Err(CoreError::Conflict(if available_stock <= 0 {
            "This item is out of stock".to_string()
        } else {
            format!("Only {available_stock} left in stock")
        }));
    }
    Ok(())
}

/// Shipping fee for a given subtotal.
pub fn shipping_for(subtotal: Money) -> Money {
    if subtotal <= Decimal::ZERO || subtotal >= Decimal::from(FREE_SHIPPING_THRESHOLD) {
        Decimal::ZERO
    } else {
        Decimal::from(FLAT_SHIPPING_FEE)
    }
}

/// Compute cart totals. Lines without an MRP count their price as MRP.
pub fn price_cart(lines: &[CartLine]) -> CartTotals {
    let mut item_count = 0;
    let mut subtotal = Decimal::ZERO;
    let mut mrp_total = Decimal::ZERO;

    for line in lines {
        let qty = Decimal::from(line.quantity);
        item_count += line.quantity;
        subtotal += line.unit_price * qty;
        let mrp = line
            .unit_mrp
            .filter(|m| *m >= line.unit_price)
            .unwrap_or(line.unit_price);
        mrp_total += mrp * qty;
    }

    let shipping = shipping_for(subtotal);
    CartTotals {
        item_count,
        subtotal,
        mrp_total,
        savings: mrp_total - subtotal,
        shipping,
        total: subtotal + shipping,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn dec(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn empty_cart_is_all_zero() {
        let totals = price_cart(&[]);
        assert_eq!(totals.item_count, 0);
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn small_cart_pays_shipping() {
        let totals = price_cart(&[CartLine {
            unit_price: dec("120.50"),
            unit_mrp: Some(dec("150")),
            quantity: 2,
        }]);
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.subtotal, dec("241.00"));
        assert_eq!(totals.mrp_total, dec("300"));
        assert_eq!(totals.savings, dec("59.00"));
        assert_eq!(totals.shipping, dec("49"));
        assert_eq!(totals.total, dec("290.00"));
    }

    #[test]
    fn threshold_cart_ships_free() {
        let totals = price_cart(&[
            CartLine {
                unit_price: dec("399"),
                unit_mrp: None,
                quantity: 1,
            },
            CartLine {
                unit_price: dec("100"),
                unit_mrp: Some(dec("90")),
                quantity: 1,
            },
        ]);
        assert_eq!(totals.subtotal, dec("499"));
        assert_eq!(totals.shipping, Decimal::ZERO);
        // An MRP below the price is ignored rather than producing negative savings.
        assert_eq!(totals.savings, Decimal::ZERO);
    }

    #[test]
    fn quantity_bounds() {
        assert!(check_quantity(1, 5).is_ok());
        assert!(check_quantity(MAX_QTY_PER_LINE, 50).is_ok());
        assert_matches!(check_quantity(0, 5), Err(CoreError::Validation(_)));
        assert_matches!(
            check_quantity(MAX_QTY_PER_LINE + 1, 50),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn quantity_over_stock_conflicts() {
        assert_matches!(
            check_quantity(3, 2),
            Err(CoreError::Conflict(msg)) if msg == "Only 2 left in stock"
        );
        assert_matches!(
            check_quantity(1, 0),
            Err(CoreError::Conflict(msg)) if msg.contains("out of stock")
        );
    }
}
