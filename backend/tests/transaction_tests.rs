//! Transaction builder tests
//!
//! Covers totals arithmetic, payment status derivation, transaction
//! numbering, and the ledger reversibility rules the builder and the
//! reversal engine rely on.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    apply_stock_delta, balance_effect_on_create, balance_effect_on_payment, compute_totals,
    movement_note, stock_delta_on_create, LineAmounts, PaymentStatus, TransactionKind,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Full walkthrough of a sale: 5 units at 100 from a container
    /// holding 10, tax 90, paid in full.
    #[test]
    fn test_fully_paid_sale_walkthrough() {
        let lines = [LineAmounts {
            quantity: 5,
            unit_price: dec("100"),
        }];
        let (subtotal, total) = compute_totals(&lines, dec("90"), Decimal::ZERO);
        assert_eq!(subtotal, dec("500"));
        assert_eq!(total, dec("590"));

        let paid = dec("590");
        assert_eq!(
            PaymentStatus::from_amounts(paid, total),
            PaymentStatus::Paid
        );

        // Stock drops from 10 to 5 and the movement note records it
        let delta = stock_delta_on_create(TransactionKind::Sale, 5);
        assert_eq!(delta, -5);
        let after = apply_stock_delta(10, delta).unwrap();
        assert_eq!(after, 5);
        let note = movement_note("Sale SALE-0001", 10, after);
        assert!(note.contains("10 → 5"));

        // Fully paid, so the counterparty balance is untouched
        let outstanding = total - paid;
        assert_eq!(
            balance_effect_on_create(TransactionKind::Sale, outstanding),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_discount_reduces_total() {
        let lines = [LineAmounts {
            quantity: 3,
            unit_price: dec("200"),
        }];
        let (subtotal, total) = compute_totals(&lines, dec("60"), dec("110"));
        assert_eq!(subtotal, dec("600"));
        assert_eq!(total, dec("550"));
    }

    #[test]
    fn test_status_transitions() {
        let total = dec("1000");
        assert_eq!(
            PaymentStatus::from_amounts(Decimal::ZERO, total),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::from_amounts(dec("400"), total),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(dec("1000"), total),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::from_amounts(dec("1200"), total),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_transaction_number_format() {
        assert_eq!(TransactionKind::Sale.format_number(1), "SALE-0001");
        assert_eq!(TransactionKind::Sale.format_number(42), "SALE-0042");
        assert_eq!(TransactionKind::Purchase.format_number(7), "PUR-0007");
        // Numbers past four digits keep growing instead of wrapping
        assert_eq!(TransactionKind::Sale.format_number(12345), "SALE-12345");
    }

    #[test]
    fn test_purchase_balance_moves_negative() {
        // An unpaid purchase leaves the business owing the supplier
        let effect = balance_effect_on_create(TransactionKind::Purchase, dec("300"));
        assert_eq!(effect, dec("-300"));

        // Settling it moves the balance back toward zero
        let settle = balance_effect_on_payment(TransactionKind::Purchase, dec("300"));
        assert_eq!(effect + settle, Decimal::ZERO);
    }

    #[test]
    fn test_sale_reversal_restores_stock() {
        let delta = stock_delta_on_create(TransactionKind::Sale, 4);
        let after = apply_stock_delta(9, delta).unwrap();
        assert_eq!(after, 5);
        let restored = apply_stock_delta(after, -delta).unwrap();
        assert_eq!(restored, 9);
    }

    #[test]
    fn test_purchase_reversal_can_fail_on_sold_stock() {
        // Purchase of 10 into an empty container, then 8 sold elsewhere:
        // reversing the purchase would need 10 but only 2 remain.
        let purchase = stock_delta_on_create(TransactionKind::Purchase, 10);
        let after = apply_stock_delta(0, purchase).unwrap();
        let after_sale = apply_stock_delta(after, -8).unwrap();
        assert_eq!(after_sale, 2);
        assert!(apply_stock_delta(after_sale, -purchase).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// total = subtotal + tax − discount for any line set
    #[test]
    fn prop_totals_invariant(
        quantities in prop::collection::vec(1i32..1000, 1..10),
        price_cents in 0i64..100_000,
        tax_cents in 0i64..10_000,
        discount_cents in 0i64..10_000,
    ) {
        let unit_price = Decimal::new(price_cents, 2);
        let lines: Vec<LineAmounts> = quantities
            .iter()
            .map(|&quantity| LineAmounts { quantity, unit_price })
            .collect();
        let tax = Decimal::new(tax_cents, 2);
        let discount = Decimal::new(discount_cents, 2);

        let (subtotal, total) = compute_totals(&lines, tax, discount);
        let expected_subtotal: Decimal = quantities
            .iter()
            .map(|&q| Decimal::from(q) * unit_price)
            .sum();

        prop_assert_eq!(subtotal, expected_subtotal);
        prop_assert_eq!(total, subtotal + tax - discount);
    }

    /// Create-then-reverse returns every stock position to its
    /// starting quantity for any mix of lines
    #[test]
    fn prop_ledger_reversibility(
        starts in prop::collection::vec(0i32..10_000, 1..8),
        quantities in prop::collection::vec(1i32..1000, 1..8),
        sale in any::<bool>(),
    ) {
        let kind = if sale { TransactionKind::Sale } else { TransactionKind::Purchase };
        for (&start, &qty) in starts.iter().zip(quantities.iter()) {
            let delta = stock_delta_on_create(kind, qty);
            if let Ok(after) = apply_stock_delta(start, delta) {
                let restored = apply_stock_delta(after, -delta).unwrap();
                prop_assert_eq!(restored, start);
            }
        }
    }

    /// Create and reversal balance effects cancel for any outstanding
    #[test]
    fn prop_balance_reversibility(outstanding_cents in 0i64..100_000_000, sale in any::<bool>()) {
        let kind = if sale { TransactionKind::Sale } else { TransactionKind::Purchase };
        let outstanding = Decimal::new(outstanding_cents, 2);
        let applied = balance_effect_on_create(kind, outstanding);
        prop_assert_eq!(applied - applied, Decimal::ZERO);
        prop_assert_eq!(applied + -applied, Decimal::ZERO);
    }

    /// Sequence-allocated numbers of the same kind never collide
    #[test]
    fn prop_numbers_unique_per_sequence(a in 1i64..1_000_000, b in 1i64..1_000_000) {
        prop_assume!(a != b);
        for kind in [TransactionKind::Sale, TransactionKind::Purchase] {
            prop_assert_ne!(kind.format_number(a), kind.format_number(b));
        }
    }
}
