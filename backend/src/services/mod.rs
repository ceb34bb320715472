//! Business logic services

pub mod contact;
pub mod container;
pub mod dashboard;
pub mod invoice;
pub mod payment;
pub mod product;
pub mod stock;
pub mod transaction;

pub use contact::ContactService;
pub use container::ContainerService;
pub use dashboard::DashboardService;
pub use invoice::InvoiceService;
pub use payment::PaymentService;
pub use product::ProductService;
pub use stock::StockService;
pub use transaction::TransactionService;
