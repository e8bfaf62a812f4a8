/// Mail message and the `Mailer` trait
///
/// A [`Mailer`] delivers one fully rendered [`MailMessage`]. Backends:
///
/// - [`LogMailer`](super::LogMailer): writes the message to the log
/// - [`HttpMailer`](super::HttpMailer): posts the message to a mail relay
/// - [`MemoryMailer`](super::MemoryMailer): keeps messages in memory (tests)
///
/// # Example
///
/// ```no_run
/// use taskgate_worker::mail::{MailAddress, MailMessage, Mailer, MailResult};
/// use async_trait::async_trait;
///
/// struct StdoutMailer;
///
/// #[async_trait]
/// impl Mailer for StdoutMailer {
///     fn name(&self) -> &str {
///         "stdout"
///     }
///
///     async fn send(&self, message: &MailMessage) -> MailResult<()> {
///         println!("{}: {}", message.to.email, message.subject);
///         Ok(())
///     }
/// }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// The relay could not be reached
    #[error("Mail transport failed: {0}")]
    Transport(String),

    /// The relay answered with a non-success status
    #[error("Mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Backend is misconfigured
    #[error("Invalid mail configuration: {0}")]
    Configuration(String),
}

/// Mail result type alias
pub type MailResult<T> = Result<T, MailError>;

/// Mailbox: address plus optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAddress {
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MailAddress {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub from: MailAddress,
    pub to: MailAddress,
    pub subject: String,

    /// Plain-text body
    pub text: String,

    /// Delivery tags for filtering at the relay
    pub tags: Vec<String>,

    /// Key/value metadata forwarded to the relay
    pub metadata: BTreeMap<String, String>,
}

/// Mail delivery backend
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// Delivers one message
    async fn send(&self, message: &MailMessage) -> MailResult<()>;
}
