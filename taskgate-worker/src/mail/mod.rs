/// Outgoing mail
///
/// - [`mailer`]: the [`Mailer`] trait and [`MailMessage`]
/// - [`backends`]: log, HTTP relay, and in-memory mailers
///
/// This module also renders the task-completion message.

pub mod backends;
pub mod mailer;

pub use backends::{HttpMailer, LogMailer, MemoryMailer};
pub use mailer::{MailAddress, MailError, MailMessage, MailResult, Mailer};

use std::collections::BTreeMap;

use taskgate_shared::models::{task::Task, user::User};

/// Tag attached to every task notification
pub const TASK_TAG: &str = "task";

/// Sender identity and link base for rendered mail
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// Envelope sender
    pub from: MailAddress,

    /// Public base URL used to build links, without trailing slash
    pub app_url: String,
}

impl MailSettings {
    pub fn new(from: MailAddress, app_url: impl Into<String>) -> Self {
        Self {
            from,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Link to a task's page
    pub fn task_url(&self, task: &Task) -> String {
        format!("{}/tasks/{}", self.app_url, task.id)
    }
}

/// Renders the notification sent to a task's owner on completion
pub fn completion_mail(task: &Task, owner: &User, settings: &MailSettings) -> MailMessage {
    let url = settings.task_url(task);

    let text = format!(
        "Hello {name},\n\n\
         Your task \"{task}\" has been marked as completed.\n\n\
         {description}\n\n\
         View task: {url}\n",
        name = owner.name,
        task = task.name,
        description = task.description,
    );

    let mut metadata = BTreeMap::new();
    metadata.insert("task_id".to_string(), task.id.to_string());

    MailMessage {
        from: settings.from.clone(),
        to: MailAddress::new(owner.email.clone(), Some(owner.name.clone())),
        subject: format!("Task Completed: {}", task.name),
        text,
        tags: vec![TASK_TAG.to_string()],
        metadata,
    }
}
