//! Per-member worker pool in front of the engine.
//!
//! ```text
//! EventSender ──▶ inbound queue ──▶ router ──▶ worker[shard(user)] ──▶ RoleSyncEngine
//! ```
//!
//! Events for one member always land on the same worker and are processed
//! strictly in arrival order. Different members spread across workers and
//! run in parallel.

use crate::engine::{Outcome, RoleSyncEngine};
use crate::event::ReactionEvent;
use crate::ids::UserId;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default number of worker tasks.
pub const DEFAULT_WORKERS: usize = 8;

/// Default capacity of the inbound queue and of each worker queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Worker pool sizing.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker tasks (at least one is always started).
    pub workers: usize,
    /// Capacity of the inbound queue and of each worker queue.
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Counts of processed events by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub processed: u64,
    pub ignored: u64,
    pub tos: u64,
    pub selected: u64,
    pub deselected: u64,
    pub abandoned: u64,
    pub failed: u64,
}

impl DispatcherStats {
    fn record(&mut self, outcome: &Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Ignored(_) => self.ignored += 1,
            Outcome::TosGranted | Outcome::TosRevoked => self.tos += 1,
            Outcome::RoleSelected { .. } => self.selected += 1,
            Outcome::RoleDeselected { .. } => self.deselected += 1,
            Outcome::Abandoned(_) => self.abandoned += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: &DispatcherStats) {
        self.processed += other.processed;
        self.ignored += other.ignored;
        self.tos += other.tos;
        self.selected += other.selected;
        self.deselected += other.deselected;
        self.abandoned += other.abandoned;
        self.failed += other.failed;
    }
}

/// Worker index for `user_id` in a pool of `workers`.
pub(crate) fn shard_for(user_id: UserId, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    (hasher.finish() % workers.max(1) as u64) as usize
}

/// Cloneable producer side of the dispatcher.
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::Sender<ReactionEvent>,
}

impl EventSender {
    /// Queues an event, waiting for space. Returns false once the dispatcher
    /// has shut down.
    pub async fn submit(&self, event: ReactionEvent) -> bool {
        match self.inner.send(event).await {
            Ok(()) => true,
            Err(err) => {
                warn!(user_id = %err.0.user_id, "Dispatcher closed, dropping reaction event");
                false
            }
        }
    }

    /// Queues an event without waiting. Drops it when the queue is full.
    pub fn try_submit(&self, event: ReactionEvent) -> bool {
        match self.inner.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    user_id = %event.user_id,
                    message_id = %event.message_id,
                    "Dispatcher queue full, dropping reaction event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!(user_id = %event.user_id, "Dispatcher closed, dropping reaction event");
                false
            }
        }
    }
}

/// Owner handle of a running dispatcher.
pub struct DispatcherHandle {
    sender: EventSender,
    stop: Option<oneshot::Sender<()>>,
    router: JoinHandle<DispatcherStats>,
}

impl DispatcherHandle {
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub async fn submit(&self, event: ReactionEvent) -> bool {
        self.sender.submit(event).await
    }

    /// Stops accepting events, drains everything already queued and waits
    /// for the workers to finish.
    pub async fn shutdown(mut self) -> DispatcherStats {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match self.router.await {
            Ok(stats) => {
                info!(
                    processed = stats.processed,
                    failed = stats.failed,
                    "Dispatcher stopped"
                );
                stats
            }
            Err(err) => {
                error!(error = %err, "Dispatcher router task failed");
                DispatcherStats::default()
            }
        }
    }
}

/// Spawns the per-member worker pool.
pub struct Dispatcher;

impl Dispatcher {
    /// Starts the router and worker tasks on the current runtime.
    pub fn spawn(engine: Arc<RoleSyncEngine>, config: DispatcherConfig) -> DispatcherHandle {
        let capacity = config.queue_capacity.max(1);
        let (sender, inbound) = mpsc::channel(capacity);
        let (stop_tx, stop_rx) = oneshot::channel();

        let router = tokio::spawn(route(inbound, stop_rx, engine, config));

        DispatcherHandle {
            sender: EventSender { inner: sender },
            stop: Some(stop_tx),
            router,
        }
    }
}

async fn route(
    mut inbound: mpsc::Receiver<ReactionEvent>,
    mut stop: oneshot::Receiver<()>,
    engine: Arc<RoleSyncEngine>,
    config: DispatcherConfig,
) -> DispatcherStats {
    let workers = config.workers.max(1);
    let capacity = config.queue_capacity.max(1);

    let mut shards = Vec::with_capacity(workers);
    let mut tasks = Vec::with_capacity(workers);
    for index in 0..workers {
        let (tx, rx) = mpsc::channel(capacity);
        shards.push(tx);
        tasks.push(tokio::spawn(run_worker(index, rx, engine.clone())));
    }

    info!(workers, capacity, "Dispatcher started");

    loop {
        tokio::select! {
            maybe_event = inbound.recv() => match maybe_event {
                Some(event) => forward(&shards, event).await,
                None => break,
            },
            _ = &mut stop => {
                inbound.close();
                while let Some(event) = inbound.recv().await {
                    forward(&shards, event).await;
                }
                break;
            }
        }
    }

    drop(shards);

    let mut stats = DispatcherStats::default();
    for task in tasks {
        match task.await {
            Ok(worker_stats) => stats.merge(&worker_stats),
            Err(err) => error!(error = %err, "Dispatcher worker task failed"),
        }
    }
    stats
}

async fn forward(shards: &[mpsc::Sender<ReactionEvent>], event: ReactionEvent) {
    let shard = shard_for(event.user_id, shards.len());
    if let Err(err) = shards[shard].send(event).await {
        error!(shard, user_id = %err.0.user_id, "Worker queue closed, dropping reaction event");
    }
}

async fn run_worker(
    index: usize,
    mut events: mpsc::Receiver<ReactionEvent>,
    engine: Arc<RoleSyncEngine>,
) -> DispatcherStats {
    let mut stats = DispatcherStats::default();
    while let Some(event) = events.recv().await {
        let outcome = engine.handle(&event).await;
        debug!(worker = index, outcome = ?outcome, "Reaction event processed");
        stats.record(&outcome);
    }
    stats
}
