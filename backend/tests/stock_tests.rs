//! Stock ledger tests
//!
//! Covers the delta rule guarding non-negativity, the zero-quantity
//! soft-delete boundary, movement note rendering, and the stock-count
//! correction arithmetic.

use proptest::prelude::*;

use shared::{apply_stock_delta, movement_note, StockAction};
use std::str::FromStr;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_delta_rules() {
        assert_eq!(apply_stock_delta(0, 10), Ok(10));
        assert_eq!(apply_stock_delta(10, -10), Ok(0));
        assert!(apply_stock_delta(0, -1).is_err());
        assert!(apply_stock_delta(3, -4).is_err());
    }

    /// Quantity zero is valid (the position gets soft-deleted, not
    /// rejected); only below-zero results fail
    #[test]
    fn test_zero_is_the_soft_delete_boundary() {
        let at_zero = apply_stock_delta(5, -5).unwrap();
        assert_eq!(at_zero, 0);
        let restored = apply_stock_delta(at_zero, 3).unwrap();
        assert_eq!(restored, 3);
    }

    #[test]
    fn test_movement_note_rendering() {
        assert_eq!(movement_note("Sale SALE-0001", 10, 5), "Sale SALE-0001 - 10 → 5");
        assert_eq!(movement_note("Stock count", 0, 12), "Stock count - 0 → 12");
    }

    #[test]
    fn test_action_vocabulary_round_trips() {
        for action in [
            StockAction::Sale,
            StockAction::Purchase,
            StockAction::Added,
            StockAction::Removed,
        ] {
            assert_eq!(StockAction::from_str(action.as_str()), Ok(action));
        }
        assert!(StockAction::from_str("transfer").is_err());
    }

    /// Stock-count corrections work by delta, so setting the current
    /// quantity is a no-op and anything else lands exactly on target
    #[test]
    fn test_stock_count_delta_arithmetic() {
        let current = 7;
        for desired in [0, 3, 7, 20] {
            let delta = desired - current;
            if delta == 0 {
                continue;
            }
            assert_eq!(apply_stock_delta(current, delta), Ok(desired));
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// The delta rule never lets a quantity go negative
    #[test]
    fn prop_non_negativity(start in 0i32..100_000, delta in -100_000i32..100_000) {
        match apply_stock_delta(start, delta) {
            Ok(result) => prop_assert!(result >= 0),
            Err(_) => prop_assert!(start + delta < 0),
        }
    }

    /// A correction delta always lands on the desired quantity
    #[test]
    fn prop_correction_lands_on_target(current in 0i32..100_000, desired in 0i32..100_000) {
        prop_assume!(current != desired);
        let delta = desired - current;
        prop_assert_eq!(apply_stock_delta(current, delta), Ok(desired));
    }

    /// The note always carries both the before and after quantities
    #[test]
    fn prop_note_contains_before_and_after(old in 0i32..100_000, new in 0i32..100_000) {
        let note = movement_note("Adjustment", old, new);
        prop_assert!(note.contains(&old.to_string()));
        prop_assert!(note.contains(&new.to_string()));
        prop_assert!(note.starts_with("Adjustment"));
    }
}
