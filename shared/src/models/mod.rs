//! Domain models for the TradeBook inventory platform

mod contact;
mod container;
mod payment;
mod product;
mod stock;
mod transaction;

pub use contact::*;
pub use container::*;
pub use payment::*;
pub use product::*;
pub use stock::*;
pub use transaction::*;
