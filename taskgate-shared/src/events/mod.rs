/// Domain events
///
/// The only event today is [`TaskCompleted`], raised when an update moves a
/// task into the `completed` status. The code that persists the update does
/// not know who listens: it hands the event to a [`CompletionNotifier`] after
/// the transaction has committed.
///
/// Notifiers must return immediately. Anything slow (sending mail) happens on
/// a background task owned by the notifier, and a notifier failure never
/// fails the update that raised the event.
///
/// # Example
///
/// ```
/// use taskgate_shared::events::{CompletionNotifier, RecordingNotifier, TaskCompleted};
/// # use taskgate_shared::models::task::Task;
///
/// # fn example(task: Task) {
/// let notifier = RecordingNotifier::default();
/// notifier.task_completed(TaskCompleted { task });
///
/// assert_eq!(notifier.events().len(), 1);
/// # }
/// ```

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::Task;

/// A task moved into the `completed` status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompleted {
    /// The task as stored after the update
    pub task: Task,
}

impl TaskCompleted {
    pub fn task_id(&self) -> Uuid {
        self.task.id
    }
}

/// Receives task-completion events
pub trait CompletionNotifier: Send + Sync {
    /// Accepts an event without blocking the caller
    fn task_completed(&self, event: TaskCompleted);
}

/// Notifier that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl CompletionNotifier for NoopNotifier {
    fn task_completed(&self, event: TaskCompleted) {
        tracing::debug!(task_id = %event.task_id(), "Dropping task completion event");
    }
}

/// Notifier that keeps every event in memory
///
/// Clones share the same buffer, so a test can hand one clone to the
/// application and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<TaskCompleted>>>,
}

impl RecordingNotifier {
    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<TaskCompleted> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of events received for one task
    pub fn count_for(&self, task_id: Uuid) -> usize {
        self.events()
            .iter()
            .filter(|event| event.task_id() == task_id)
            .count()
    }
}

impl CompletionNotifier for RecordingNotifier {
    fn task_completed(&self, event: TaskCompleted) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
