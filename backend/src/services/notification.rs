//! Low-stock notifications
//!
//! The ledger engine calls a [`Notifier`] after a movement leaves a product at
//! or below its minimum stock. Delivery failures are reported as
//! [`NotifyError`] and never fail the movement that triggered them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::NotificationConfig;
use crate::external::{MailMessage, MailRelayClient, MailRelayError};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error(transparent)]
    Relay(#[from] MailRelayError),

    #[error("notification channel misconfigured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_low_stock(
        &self,
        product_name: &str,
        current_stock: i64,
        min_stock: i64,
    ) -> Result<(), NotifyError>;
}

/// Build the notifier selected by configuration
pub fn from_config(config: &NotificationConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match &config.relay_url {
        Some(url) if !url.trim().is_empty() => {
            let client =
                MailRelayClient::new(url.clone(), Duration::from_secs(config.timeout_secs))?;
            tracing::info!("Low-stock alerts go to mail relay {}", client.endpoint());
            Ok(Arc::new(MailRelayNotifier::new(
                client,
                config.sender.clone(),
                config.recipient.clone(),
            )))
        }
        Some(_) => Err(NotifyError::Misconfigured(
            "notification.relay_url is blank".to_string(),
        )),
        None => {
            tracing::info!("No mail relay configured; low-stock alerts are logged only");
            Ok(Arc::new(LogNotifier))
        }
    }
}

pub fn alert_subject(product_name: &str) -> String {
    format!("Low Stock Alert: {}", product_name)
}

pub fn alert_body(product_name: &str, current_stock: i64, min_stock: i64) -> String {
    format!(
        "<h2>Low Stock Alert</h2>\
         <p>Product <strong>{}</strong> is running low.</p>\
         <p>Current stock: {}<br>Minimum stock: {}</p>\
         <p>Please reorder soon.</p>",
        escape_html(product_name),
        current_stock,
        min_stock
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes the alert to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_low_stock(
        &self,
        product_name: &str,
        current_stock: i64,
        min_stock: i64,
    ) -> Result<(), NotifyError> {
        tracing::warn!(
            product = product_name,
            current_stock,
            min_stock,
            "{}",
            alert_subject(product_name)
        );
        Ok(())
    }
}

/// Sends the alert through the mail relay webhook
#[derive(Clone)]
pub struct MailRelayNotifier {
    client: MailRelayClient,
    sender: String,
    recipient: Option<String>,
}

impl MailRelayNotifier {
    pub fn new(client: MailRelayClient, sender: String, recipient: Option<String>) -> Self {
        Self {
            client,
            sender,
            recipient,
        }
    }

    pub fn message(&self, product_name: &str, current_stock: i64, min_stock: i64) -> MailMessage {
        MailMessage {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            subject: alert_subject(product_name),
            html: alert_body(product_name, current_stock, min_stock),
        }
    }
}

#[async_trait]
impl Notifier for MailRelayNotifier {
    async fn notify_low_stock(
        &self,
        product_name: &str,
        current_stock: i64,
        min_stock: i64,
    ) -> Result<(), NotifyError> {
        let message = self.message(product_name, current_stock, min_stock);
        self.client.send(&message).await?;
        tracing::info!(product = product_name, "Low-stock alert sent");
        Ok(())
    }
}
