//! Per-user message dispatch.
//!
//! Every user gets a worker task fed by its own queue. The worker runs the
//! dialogue engine and delivers the replies before it looks at that user's
//! next message, so one user's messages are handled strictly in order while
//! different users are handled in parallel.
//!
//! ```text
//! Channel::listen ─► mpsc ─► Dispatcher ─┬─► worker(user A) ─► engine ─► Channel::send
//!                                        └─► worker(user B) ─► engine ─► Channel::send
//! ```

use crate::dialogue::DialogueEngine;
use crate::message::InboundEvent;
use crate::session::UserId;
use crate::traits::Channel;
use dashmap::DashMap;
use mathbot_common::util::truncate_with_ellipsis;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

struct WorkerSlot {
    queue: mpsc::UnboundedSender<InboundEvent>,
    task: JoinHandle<()>,
}

/// Routes inbound events to per-user workers.
pub struct Dispatcher {
    engine: Arc<DialogueEngine>,
    channel: Arc<dyn Channel>,
    workers: Arc<DashMap<UserId, WorkerSlot>>,
    worker_idle: Duration,
}

impl Dispatcher {
    /// Default time a worker waits for its user's next message before exiting.
    pub const DEFAULT_WORKER_IDLE: Duration = Duration::from_secs(300);

    pub fn new(engine: Arc<DialogueEngine>, channel: Arc<dyn Channel>) -> Self {
        Self {
            engine,
            channel,
            workers: Arc::new(DashMap::new()),
            worker_idle: Self::DEFAULT_WORKER_IDLE,
        }
    }

    /// Set how long an idle worker lingers.
    pub fn with_worker_idle(mut self, idle: Duration) -> Self {
        self.worker_idle = idle;
        self
    }

    /// Number of users with a live worker.
    pub fn active_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue an event on its user's worker, starting the worker if needed.
    ///
    /// Enqueueing happens under the map shard lock, which is also what an
    /// idle worker takes to retire, so an event can never land in the queue
    /// of a worker that is shutting down.
    pub fn dispatch(&self, event: InboundEvent) {
        let user_id = event.user_id.clone();
        let mut slot = self
            .workers
            .entry(user_id.clone())
            .or_insert_with(|| self.spawn_worker(user_id.clone()));

        if let Err(mpsc::error::SendError(event)) = slot.queue.send(event) {
            tracing::debug!(user_id = %user_id, "Worker gone, restarting");
            *slot = self.spawn_worker(user_id);
            if slot.queue.send(event).is_err() {
                tracing::error!("Freshly spawned worker rejected an event");
            }
        }
    }

    /// Spawn the loop that feeds inbound events into the dispatcher.
    pub fn spawn_processor(
        dispatcher: Arc<Self>,
        mut rx: mpsc::Receiver<InboundEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(channel = dispatcher.channel.name(), "Dispatcher started");

            while let Some(event) = rx.recv().await {
                dispatcher.dispatch(event);
            }

            tracing::info!("Dispatcher stopped");
        })
    }

    /// Stop all workers after they finish what is already queued.
    pub async fn shutdown(&self) {
        let users: Vec<UserId> = self.workers.iter().map(|e| e.key().clone()).collect();

        for user_id in users {
            let Some((_, slot)) = self.workers.remove(&user_id) else {
                continue;
            };
            drop(slot.queue);
            if let Err(e) = slot.task.await {
                tracing::warn!(user_id = %user_id, error = %e, "User worker ended abnormally");
            }
        }
    }

    fn spawn_worker(&self, user_id: UserId) -> WorkerSlot {
        let (queue, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            user_id,
            engine: self.engine.clone(),
            channel: self.channel.clone(),
            workers: self.workers.clone(),
            idle: self.worker_idle,
        };
        let task = tokio::spawn(worker.run(rx));
        WorkerSlot { queue, task }
    }
}

struct Worker {
    user_id: UserId,
    engine: Arc<DialogueEngine>,
    channel: Arc<dyn Channel>,
    workers: Arc<DashMap<UserId, WorkerSlot>>,
    idle: Duration,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<InboundEvent>) {
        tracing::debug!(user_id = %self.user_id, "User worker started");

        loop {
            match tokio::time::timeout(self.idle, rx.recv()).await {
                Ok(Some(event)) => self.process(event).await,
                Ok(None) => break,
                Err(_) => {
                    let retired = self
                        .workers
                        .remove_if(&self.user_id, |_, _| rx.is_empty())
                        .is_some();
                    if retired {
                        break;
                    }
                }
            }
        }

        tracing::debug!(user_id = %self.user_id, "User worker stopped");
    }

    async fn process(&self, event: InboundEvent) {
        let span = mathbot_common::channel_span!(
            event.channel_type.as_str(),
            event.trace_id,
            event.user_id,
            message_id = %event.id
        );

        async {
            tracing::info!(
                text = %truncate_with_ellipsis(&event.text, 64),
                is_command = event.is_command,
                "Message received"
            );

            let commands = self.engine.handle(&event).await;
            for command in commands {
                let kind = command.kind();
                let outgoing = event.reply(command);
                // State is already committed; a failed delivery is only reported.
                if let Err(e) = self.channel.send(&outgoing).await {
                    tracing::error!(
                        error = %e,
                        kind,
                        chat_id = %outgoing.chat_id,
                        "Failed to deliver reply"
                    );
                }
            }
        }
        .instrument(span)
        .await;
    }
}
