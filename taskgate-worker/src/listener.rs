/// Task-completion listener
///
/// Consumes [`TaskCompleted`] events: looks up the task's owner and mails
/// them a notification. A task whose owner no longer exists (or is
/// soft-deleted) is skipped without error.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use taskgate_shared::{
    events::TaskCompleted,
    models::{user::User, Trashed},
};

use crate::mail::{completion_mail, MailError, MailSettings, Mailer};

/// Errors raised while handling an event
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Owner lookup failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Mail delivery failed
    #[error(transparent)]
    Mail(#[from] MailError),
}

/// What happened to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Notification handed to the mailer
    Sent,

    /// Owner missing; nothing sent
    SkippedNoOwner,
}

/// Something that reacts to a completed task
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn handle(&self, event: &TaskCompleted) -> Result<Delivery, HandlerError>;
}

/// Mails the task owner when their task is completed
pub struct TaskCompletionListener {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
    settings: MailSettings,
}

impl TaskCompletionListener {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>, settings: MailSettings) -> Self {
        Self {
            db,
            mailer,
            settings,
        }
    }
}

#[async_trait]
impl CompletionHandler for TaskCompletionListener {
    async fn handle(&self, event: &TaskCompleted) -> Result<Delivery, HandlerError> {
        let task = &event.task;

        let Some(owner) = User::find_by_id(&self.db, task.user_id, Trashed::Without).await? else {
            tracing::debug!(
                task_id = %task.id,
                user_id = %task.user_id,
                "Task owner not found, skipping completion mail"
            );
            return Ok(Delivery::SkippedNoOwner);
        };

        let message = completion_mail(task, &owner, &self.settings);
        self.mailer.send(&message).await?;

        tracing::info!(
            task_id = %task.id,
            to = %owner.email,
            mailer = self.mailer.name(),
            "Sent task completion mail"
        );

        Ok(Delivery::Sent)
    }
}
