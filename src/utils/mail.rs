// src/utils/mail.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::error::MailError;

/// A single outbound HTML message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Delivery seam for notifications, so a queue-backed sender can replace the relay.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Posts messages as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpMailRelay {
    /// `timeout` bounds each request, so a stalled relay cannot hold the caller.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Used when no relay is configured: the message only reaches the log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(
            "No mail relay configured, dropping \"{}\" for {}",
            email.subject,
            email.to.join(", ")
        );
        tracing::debug!("Message body:\n{}", email.html);
        Ok(())
    }
}
