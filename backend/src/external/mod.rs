//! External API integrations

pub mod mail_relay;

pub use mail_relay::{MailMessage, MailRelayClient, MailRelayError};
