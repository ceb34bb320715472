//! External collaborators the ledger calls into

pub mod store;

pub use store::{InvoiceStore, StoredDocument};
