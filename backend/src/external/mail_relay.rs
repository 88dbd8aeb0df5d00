//! Mail relay webhook client
//!
//! Posts a JSON message (`from`, `to`, `subject`, `html`) to an HTTP mail
//! relay. The relay is responsible for SMTP delivery.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailRelayError {
    #[error("mail relay request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail relay returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outgoing message as the relay expects it
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Option<String>,
    pub subject: String,
    pub html: String,
}

/// Mail relay API client
#[derive(Clone)]
pub struct MailRelayClient {
    client: Client,
    endpoint: String,
}

impl MailRelayClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, MailRelayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, message: &MailMessage) -> Result<(), MailRelayError> {
        let response = self.client.post(&self.endpoint).json(message).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MailRelayError::Rejected { status, body });
        }

        Ok(())
    }
}
