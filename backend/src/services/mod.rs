//! Business logic services for the stock ledger

pub mod auth;
pub mod catalog;
pub mod ledger;
pub mod notification;
pub mod report_pdf;
pub mod reporting;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use ledger::LedgerService;
pub use notification::{LogNotifier, MailRelayNotifier, Notifier, NotifyError};
pub use reporting::ReportingService;
