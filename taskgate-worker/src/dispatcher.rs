/// Background notification dispatcher
///
/// Bridges the synchronous [`CompletionNotifier`] interface used by request
/// handlers to an async [`CompletionHandler`] running on its own Tokio task.
///
/// # Architecture
///
/// ```text
/// handler ──task_completed()──> unbounded mpsc ──> dispatcher loop
///                                                   └─> tokio::spawn(handler.handle(event))
/// ```
///
/// `task_completed` never blocks and never fails the caller. On shutdown the
/// loop stops accepting new work, drains events already queued, and waits for
/// in-flight handlers.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskgate_shared::events::CompletionNotifier;
/// use taskgate_worker::dispatcher::NotificationDispatcher;
/// use taskgate_worker::listener::CompletionHandler;
///
/// # async fn example(handler: Arc<dyn CompletionHandler>) {
/// let (dispatcher, worker) = NotificationDispatcher::spawn(handler);
/// let notifier: Arc<dyn CompletionNotifier> = Arc::new(dispatcher.clone());
///
/// // ... serve requests ...
///
/// dispatcher.shutdown();
/// let _ = worker.await;
/// # }
/// ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use taskgate_shared::events::{CompletionNotifier, TaskCompleted};

use crate::listener::{CompletionHandler, Delivery};

/// Sending half of the dispatcher
///
/// Cheap to clone; every clone feeds the same background loop.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<TaskCompleted>,
    shutdown_token: CancellationToken,
}

/// Receiving half: the loop that runs handlers
pub struct DispatcherWorker {
    receiver: mpsc::UnboundedReceiver<TaskCompleted>,
    handler: Arc<dyn CompletionHandler>,
    shutdown_token: CancellationToken,
}

impl NotificationDispatcher {
    /// Creates both halves without starting the loop
    pub fn channel(handler: Arc<dyn CompletionHandler>) -> (Self, DispatcherWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shutdown_token = CancellationToken::new();

        (
            Self {
                sender,
                shutdown_token: shutdown_token.clone(),
            },
            DispatcherWorker {
                receiver,
                handler,
                shutdown_token,
            },
        )
    }

    /// Creates the dispatcher and spawns its loop on the current runtime
    pub fn spawn(handler: Arc<dyn CompletionHandler>) -> (Self, JoinHandle<()>) {
        let (dispatcher, worker) = Self::channel(handler);
        let handle = tokio::spawn(worker.run());
        (dispatcher, handle)
    }

    /// Asks the loop to drain and stop
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }
}

impl CompletionNotifier for NotificationDispatcher {
    fn task_completed(&self, event: TaskCompleted) {
        let task_id = event.task_id();

        if self.sender.send(event).is_err() {
            tracing::warn!(task_id = %task_id, "Notification dispatcher stopped, dropping event");
        } else {
            tracing::debug!(task_id = %task_id, "Queued task completion event");
        }
    }
}

impl DispatcherWorker {
    /// Runs until shutdown is requested or every sender is dropped
    pub async fn run(mut self) {
        tracing::info!("Notification dispatcher starting");

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Shutdown requested, draining queued notifications");
                    break;
                }

                received = self.receiver.recv() => match received {
                    Some(event) => self.dispatch(&mut in_flight, event),
                    None => break,
                },

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join_error(joined);
                }
            }
        }

        self.receiver.close();
        while let Some(event) = self.receiver.recv().await {
            self.dispatch(&mut in_flight, event);
        }

        while let Some(joined) = in_flight.join_next().await {
            log_join_error(joined);
        }

        tracing::info!("Notification dispatcher stopped");
    }

    fn dispatch(&self, in_flight: &mut JoinSet<()>, event: TaskCompleted) {
        let handler = Arc::clone(&self.handler);

        in_flight.spawn(async move {
            let task_id = event.task_id();

            match handler.handle(&event).await {
                Ok(Delivery::Sent) => {
                    tracing::debug!(task_id = %task_id, "Completion notification delivered");
                }
                Ok(Delivery::SkippedNoOwner) => {}
                Err(e) => {
                    tracing::warn!(task_id = %task_id, error = %e, "Completion notification failed");
                }
            }
        });
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Notification handler panicked");
    }
}
