//! # TaskGate Worker Library
//!
//! Background side effects of task changes.
//!
//! ## Modules
//!
//! - `mail`: Mail messages and delivery backends (log, HTTP relay, memory)
//! - `listener`: Task-completion listener that mails the owner
//! - `dispatcher`: Queue that runs listeners off the request path
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskgate_worker::dispatcher::NotificationDispatcher;
//! use taskgate_worker::listener::TaskCompletionListener;
//! use taskgate_worker::mail::{LogMailer, MailAddress, MailSettings};
//!
//! # async fn example(pool: sqlx::PgPool) {
//! let settings = MailSettings::new(MailAddress::new("noreply@taskgate.local", None), "http://localhost:3000");
//! let listener = TaskCompletionListener::new(pool, Arc::new(LogMailer), settings);
//! let (dispatcher, worker) = NotificationDispatcher::spawn(Arc::new(listener));
//! # }
//! ```

pub mod dispatcher;
pub mod listener;
pub mod mail;

/// Worker version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
