//! Pure ledger arithmetic for the TradeBook inventory platform
//!
//! Every rule that decides how money and stock move lives here, free of
//! I/O, so the backend services only orchestrate reads and writes.

use rust_decimal::Decimal;

use crate::models::TransactionKind;

/// Quantity and unit price of one prospective transaction line
#[derive(Debug, Clone, Copy)]
pub struct LineAmounts {
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl LineAmounts {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// Subtotal and grand total for a set of lines:
/// `total = Σ(quantity × unit_price) + tax − discount`
pub fn compute_totals(
    lines: &[LineAmounts],
    tax_amount: Decimal,
    discount_amount: Decimal,
) -> (Decimal, Decimal) {
    let subtotal: Decimal = lines.iter().map(LineAmounts::line_total).sum();
    let total = subtotal + tax_amount - discount_amount;
    (subtotal, total)
}

/// Signed contact-balance delta applied when a transaction is created.
///
/// A sale leaves the customer owing the outstanding amount (balance
/// up); a purchase leaves the business owing the supplier (balance
/// down). Reversal negates this exact value.
pub fn balance_effect_on_create(kind: TransactionKind, outstanding: Decimal) -> Decimal {
    match kind {
        TransactionKind::Sale => outstanding,
        TransactionKind::Purchase => -outstanding,
    }
}

/// Signed contact-balance delta applied when a payment settles part of
/// a transaction: a sale payment shrinks the customer's debt, a
/// purchase payment shrinks the payable (moves the balance toward zero).
pub fn balance_effect_on_payment(kind: TransactionKind, amount: Decimal) -> Decimal {
    match kind {
        TransactionKind::Sale => -amount,
        TransactionKind::Purchase => amount,
    }
}

/// Signed stock delta a transaction line applies at creation
pub fn stock_delta_on_create(kind: TransactionKind, quantity: i32) -> i32 {
    match kind {
        TransactionKind::Sale => -quantity,
        TransactionKind::Purchase => quantity,
    }
}

/// Apply a signed delta to a stock quantity. The single rule guarding
/// stock non-negativity: any result below zero is rejected.
pub fn apply_stock_delta(old_quantity: i32, delta: i32) -> Result<i32, &'static str> {
    let new_quantity = old_quantity + delta;
    if new_quantity < 0 {
        return Err("stock quantity cannot go negative");
    }
    Ok(new_quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn totals_follow_tax_and_discount() {
        let lines = [
            LineAmounts {
                quantity: 5,
                unit_price: dec("100"),
            },
            LineAmounts {
                quantity: 2,
                unit_price: dec("49.50"),
            },
        ];
        let (subtotal, total) = compute_totals(&lines, dec("18"), dec("9"));
        assert_eq!(subtotal, dec("599"));
        assert_eq!(total, dec("608"));
    }

    #[test]
    fn create_and_payment_effects_cancel_when_fully_settled() {
        let total = dec("590");
        let create = balance_effect_on_create(TransactionKind::Sale, total);
        let settle = balance_effect_on_payment(TransactionKind::Sale, total);
        assert_eq!(create + settle, Decimal::ZERO);

        let create = balance_effect_on_create(TransactionKind::Purchase, total);
        let settle = balance_effect_on_payment(TransactionKind::Purchase, total);
        assert_eq!(create + settle, Decimal::ZERO);
    }

    #[test]
    fn stock_delta_rejects_overdraw() {
        assert_eq!(apply_stock_delta(10, -5), Ok(5));
        assert_eq!(apply_stock_delta(5, -5), Ok(0));
        assert!(apply_stock_delta(4, -5).is_err());
    }

    proptest! {
        /// Status is fully determined by the (paid, total) pair
        #[test]
        fn status_is_deterministic(paid in 0i64..1_000_000, total in 1i64..1_000_000) {
            let paid = Decimal::from(paid);
            let total = Decimal::from(total);
            let status = PaymentStatus::from_amounts(paid, total);
            if paid == Decimal::ZERO {
                prop_assert_eq!(status, PaymentStatus::Unpaid);
            } else if paid >= total {
                prop_assert_eq!(status, PaymentStatus::Paid);
            } else {
                prop_assert_eq!(status, PaymentStatus::Partial);
            }
        }

        /// Creating then reversing a transaction leaves stock untouched
        #[test]
        fn stock_effect_is_reversible(qty in 1i32..10_000, start in 0i32..10_000) {
            for kind in [TransactionKind::Sale, TransactionKind::Purchase] {
                let delta = stock_delta_on_create(kind, qty);
                if let Ok(after) = apply_stock_delta(start, delta) {
                    let restored = apply_stock_delta(after, -delta).unwrap();
                    prop_assert_eq!(restored, start);
                }
            }
        }

        /// Creating then reversing a transaction leaves the balance untouched
        #[test]
        fn balance_effect_is_reversible(outstanding in 0i64..1_000_000) {
            let outstanding = Decimal::from(outstanding);
            for kind in [TransactionKind::Sale, TransactionKind::Purchase] {
                let applied = balance_effect_on_create(kind, outstanding);
                prop_assert_eq!(applied + (-applied), Decimal::ZERO);
            }
        }
    }
}
