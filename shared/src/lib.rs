//! Shared types and models for the TradeBook inventory platform
//!
//! This crate contains the domain model and the pure ledger arithmetic
//! shared between the backend and any future frontends. It has no I/O
//! dependencies so every rule in here is testable in isolation.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
