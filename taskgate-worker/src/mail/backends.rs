/// Mailer backends

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::mailer::{MailError, MailMessage, MailResult, Mailer};

/// Writes messages to the log instead of delivering them
///
/// The default backend for development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &MailMessage) -> MailResult<()> {
        tracing::info!(
            to = %message.to.email,
            subject = %message.subject,
            tags = ?message.tags,
            metadata = ?message.metadata,
            body = %message.text,
            "Mail message"
        );
        Ok(())
    }
}

/// Posts messages as JSON to an HTTP mail relay
///
/// The relay receives the [`MailMessage`] serialized as-is. Any 2xx status
/// counts as accepted.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailer {
    /// Creates a relay client
    ///
    /// # Errors
    ///
    /// Returns `MailError::Configuration` if the endpoint is empty or the
    /// HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> MailResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(MailError::Configuration(
                "mail relay endpoint is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, message: &MailMessage) -> MailResult<()> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to = %message.to.email, status = status.as_u16(), "Mail accepted by relay");
        Ok(())
    }
}

/// Keeps sent messages in memory
///
/// Clones share the same outbox.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<MailMessage>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far
    pub fn sent(&self) -> Vec<MailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(&self, message: &MailMessage) -> MailResult<()> {
        self.outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}
