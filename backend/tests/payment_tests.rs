//! Payment reconciliation tests
//!
//! Covers remaining-balance validation, sum-derived paid amounts,
//! status recomputation, and the balance effects of recording and
//! removing payments.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    balance_effect_on_payment, PaymentKind, PaymentStatus, TransactionKind,
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

    #[test]
    fn test_remaining_balance_validation() {
        let total = dec("590");
        let paid = dec("400");
        let remaining = total - paid;

        // Within the remaining balance is fine, over it is not
        assert!(dec("190") <= remaining);
        assert!(dec("190.01") > remaining);

        // A fully paid transaction has nothing left to settle
        let remaining = total - total;
        assert!(remaining <= Decimal::ZERO);
    }

    /// paid_amount is re-derived from the live payment rows, so
    /// removing one payment drops the sum by exactly its amount
    #[test]
    fn test_sum_derived_paid_amount() {
        let payments = [dec("100"), dec("250"), dec("240")];
        let paid: Decimal = payments.iter().copied().sum();
        assert_eq!(paid, dec("590"));

        let after_removal: Decimal = payments[..2].iter().copied().sum();
        assert_eq!(after_removal, dec("350"));
        assert_eq!(paid - after_removal, payments[2]);
    }

    #[test]
    fn test_status_recomputation_after_removal() {
        let total = dec("590");
        assert_eq!(
            PaymentStatus::from_amounts(dec("590"), total),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::from_amounts(dec("350"), total),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(Decimal::ZERO, total),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn test_payment_kind_follows_transaction_kind() {
        assert_eq!(
            PaymentKind::for_transaction(TransactionKind::Sale),
            PaymentKind::Income
        );
        assert_eq!(
            PaymentKind::for_transaction(TransactionKind::Purchase),
            PaymentKind::Expense
        );
    }

    /// A sale payment shrinks the receivable; removing it grows the
    /// receivable back by the same amount
    #[test]
    fn test_balance_effect_is_linear_in_the_delta() {
        let record = balance_effect_on_payment(TransactionKind::Sale, dec("250"));
        assert_eq!(record, dec("-250"));

        let removal = balance_effect_on_payment(TransactionKind::Sale, dec("-250"));
        assert_eq!(record + removal, Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// Recording payments one at a time never disagrees with the sum
    #[test]
    fn prop_paid_amount_equals_payment_sum(
        amounts in prop::collection::vec(1i64..100_000, 0..10),
    ) {
        let mut incremental = Decimal::ZERO;
        for &cents in &amounts {
            incremental += Decimal::new(cents, 2);
        }
        let summed: Decimal = amounts.iter().map(|&c| Decimal::new(c, 2)).sum();
        prop_assert_eq!(incremental, summed);
    }

    /// Status from the derived sum matches status from the running value
    #[test]
    fn prop_status_from_sum_is_consistent(
        amounts in prop::collection::vec(1i64..100_000, 1..10),
        total_cents in 1i64..1_000_000,
    ) {
        let total = Decimal::new(total_cents, 2);
        let paid: Decimal = amounts.iter().map(|&c| Decimal::new(c, 2)).sum();
        let status = PaymentStatus::from_amounts(paid, total);
        if paid >= total {
            prop_assert_eq!(status, PaymentStatus::Paid);
        } else {
            prop_assert_eq!(status, PaymentStatus::Partial);
        }
    }

    /// Recording then removing a payment leaves the balance unchanged
    /// for either transaction kind
    #[test]
    fn prop_record_then_remove_cancels(amount_cents in 1i64..100_000, sale in any::<bool>()) {
        let kind = if sale { TransactionKind::Sale } else { TransactionKind::Purchase };
        let amount = Decimal::new(amount_cents, 2);
        let record = balance_effect_on_payment(kind, amount);
        let remove = balance_effect_on_payment(kind, -amount);
        prop_assert_eq!(record + remove, Decimal::ZERO);
    }
}
