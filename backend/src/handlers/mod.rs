//! HTTP handlers

pub mod contacts;
pub mod containers;
pub mod dashboard;
pub mod payments;
pub mod products;
pub mod stock;
pub mod transactions;

pub use contacts::*;
pub use containers::*;
pub use dashboard::*;
pub use payments::*;
pub use products::*;
pub use stock::*;
pub use transactions::*;
