//! Update dispatch loop.
//!
//! Updates are partitioned by sender id across a fixed set of workers. Each
//! worker drains its own queue one update at a time, so all updates of a
//! single user are handled strictly in arrival order while different users
//! proceed in parallel.

use crate::models::TranscriptEntry;
use crate::router::{Exchange, Router};
use crate::store::Store;
use crate::telegram::{Transport, Update};
use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

const QUEUE_CAPACITY: usize = 256;

/// Handles single updates end to end: route, surface errors, write the transcript
pub struct Dispatcher {
    router: Router,
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(router: Router, store: Arc<dyn Store>, transport: Arc<dyn Transport>) -> Self {
        Self {
            router,
            store,
            transport,
        }
    }

    /// Process one update to completion. Never fails; problems are logged
    /// and reported to the user.
    pub async fn process(&self, update: Update) {
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "Update has no message, skipping");
            return;
        };

        let Some(mut exchange) = self.router.route(&message).await else {
            debug!(update_id = update.update_id, "Message has no text or sender, skipping");
            return;
        };

        if let Err(err) = &exchange.result {
            error!(
                user_id = exchange.user_id,
                chat_id = exchange.chat_id,
                kind = err.kind().as_str(),
                error = %err,
                "Failed to handle message"
            );

            let notice = err.user_message();
            match self.transport.send_message(exchange.chat_id, notice).await {
                Ok(()) => exchange.replies.push(notice.to_string()),
                Err(send_err) => error!(
                    chat_id = exchange.chat_id,
                    error = %send_err,
                    "Failed to send error notice"
                ),
            }
        }

        if let Err(e) = self.write_transcript(&exchange).await {
            warn!(
                user_id = exchange.user_id,
                chat_id = exchange.chat_id,
                error = %e,
                "Failed to write transcript"
            );
        }
    }

    async fn write_transcript(&self, exchange: &Exchange) -> Result<()> {
        if exchange.replies.is_empty() {
            return Ok(());
        }

        let inbound = TranscriptEntry::from_user(exchange.user_id, exchange.chat_id, &exchange.text);
        self.store
            .create_message(&inbound)
            .await
            .context("Failed to save user message")?;

        for reply in &exchange.replies {
            let outbound = TranscriptEntry::from_bot(exchange.user_id, exchange.chat_id, reply);
            self.store
                .create_message(&outbound)
                .await
                .context("Failed to save bot message")?;
        }

        Ok(())
    }

    /// Start `workers` partition workers (at least one)
    pub fn start(self, workers: usize) -> (UpdateQueue, WorkerPool) {
        self.start_with_capacity(workers, QUEUE_CAPACITY)
    }

    /// Like [`Self::start`] with `capacity` queued updates per partition
    pub fn start_with_capacity(self, workers: usize, capacity: usize) -> (UpdateQueue, WorkerPool) {
        let dispatcher = Arc::new(self);
        let workers = workers.max(1);
        let capacity = capacity.max(1);

        let mut senders = Vec::with_capacity(workers);
        let mut tasks = Vec::with_capacity(workers);

        for partition in 0..workers {
            let (tx, mut rx) = mpsc::channel::<Update>(capacity);
            let dispatcher = Arc::clone(&dispatcher);

            let task = tokio::spawn(async move {
                while let Some(update) = rx.recv().await {
                    let span = info_span!("update", update_id = update.update_id, partition);
                    dispatcher.process(update).instrument(span).await;
                }
                debug!(partition, "Dispatch worker stopped");
            });

            senders.push(tx);
            tasks.push(task);
        }

        info!("✓ Dispatcher started with {} worker(s)", workers);
        (
            UpdateQueue {
                senders: Arc::new(senders),
            },
            WorkerPool { tasks },
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("dispatch worker {0} queue is full")]
    Full(usize),
    #[error("dispatch worker {0} has stopped")]
    Closed(usize),
}

/// Sending side of the dispatcher, cheap to clone
#[derive(Clone)]
pub struct UpdateQueue {
    senders: Arc<Vec<mpsc::Sender<Update>>>,
}

impl UpdateQueue {
    /// Enqueue an update on its sender's partition. Waits while that partition is full.
    pub async fn submit(&self, update: Update) -> Result<()> {
        let index = partition_for(&update, self.senders.len());
        self.senders[index]
            .send(update)
            .await
            .map_err(|_| anyhow::anyhow!("Dispatch worker {} has stopped", index))
    }

    /// Enqueue without waiting. Fails with [`SubmitError::Full`] when the partition is at capacity.
    pub fn try_submit(&self, update: Update) -> Result<(), SubmitError> {
        let index = partition_for(&update, self.senders.len());
        self.senders[index].try_send(update).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full(index),
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed(index),
        })
    }

    /// True once any worker has stopped receiving
    pub fn is_closed(&self) -> bool {
        self.senders.iter().any(|tx| tx.is_closed())
    }

    /// Feed every update of `updates` into the dispatcher until the stream ends
    pub async fn run<S>(&self, updates: S) -> Result<()>
    where
        S: Stream<Item = Update>,
    {
        let mut updates = std::pin::pin!(updates);
        while let Some(update) = updates.next().await {
            self.submit(update).await?;
        }
        Ok(())
    }
}

/// Worker tasks of a started dispatcher
pub struct WorkerPool {
    tasks: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Wait for all workers to drain their queues and exit.
    /// Workers exit once every [`UpdateQueue`] clone has been dropped.
    pub async fn join(self) {
        for result in futures::future::join_all(self.tasks).await {
            if let Err(e) = result {
                error!("Dispatch worker panicked: {}", e);
            }
        }
    }
}

/// Partition key is the sender id, falling back to the chat id
fn partition_for(update: &Update, partitions: usize) -> usize {
    let key = update
        .message
        .as_ref()
        .map(|m| m.from.as_ref().map_or(m.chat.id, |u| u.id))
        .unwrap_or(update.update_id);
    (key.unsigned_abs() % partitions as u64) as usize
}
