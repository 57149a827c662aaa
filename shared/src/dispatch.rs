//! Bounded write dispatch.
//!
//! Points are handed to a bounded queue and written by a fixed pool of writer
//! tasks, so signal processing never waits on the store and the number of
//! in-flight writes is capped by the pool size. Failed writes are retried with
//! exponential backoff and logged with enough context to replay them.

use crate::models::Point;
use crate::sink::{WriteSink, WriteTarget};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;

/// Dispatcher tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Number of writer tasks.
    pub workers: usize,
    /// Maximum number of queued points.
    pub queue_capacity: usize,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_base_delay: Duration,
    /// Upper bound for the retry delay.
    pub retry_max_delay: Duration,
    /// How long shutdown waits for the queue to drain.
    pub shutdown_grace: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 10_000,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(2),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Errors returned when a point cannot be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The queue is at capacity; the point was dropped.
    #[error("write queue is full")]
    QueueFull,

    /// The dispatcher has been shut down.
    #[error("write dispatcher is closed")]
    Closed,
}

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DispatchStats {
    /// Points accepted into the queue.
    pub enqueued: u64,
    /// Points written successfully.
    pub written: u64,
    /// Points given up on after write failures.
    pub failed: u64,
    /// Points refused because the queue was full or closed.
    pub dropped: u64,
    /// Points currently waiting in the queue.
    pub queued: usize,
    /// Points taken off the queue whose write has not finished.
    pub in_flight: usize,
}

/// Outcome of a shutdown drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// `true` if every writer finished within the grace period.
    pub drained: bool,
    /// Points still queued or being written when the writers were aborted.
    pub lost: usize,
}

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    queued: AtomicUsize,
    in_flight: AtomicUsize,
}

struct Inner {
    sender: RwLock<Option<mpsc::Sender<Point>>>,
    writers: Mutex<Option<JoinSet<()>>>,
    counters: Arc<Counters>,
    target: WriteTarget,
    shutdown_grace: Duration,
}

/// Handle to the bounded write queue and its writer pool.
///
/// Cloning is cheap; all clones feed the same queue.
#[derive(Clone)]
pub struct WriteDispatcher {
    inner: Arc<Inner>,
}

/// Calculate exponential backoff delay for retry attempts.
///
/// The delay doubles with each attempt, capped at `max_delay`.
fn calculate_backoff_delay(attempt: u32, initial_delay: Duration, max_delay: Duration) -> Duration {
    let multiplier = 2u32.saturating_pow(attempt);
    initial_delay.saturating_mul(multiplier).min(max_delay)
}

impl WriteDispatcher {
    /// Starts the writer pool.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(sink: Arc<dyn WriteSink>, target: WriteTarget, config: &DispatchConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let counters = Arc::new(Counters::default());

        let mut writers = JoinSet::new();
        for worker in 0..config.workers.max(1) {
            writers.spawn(run_writer(
                worker,
                Arc::clone(&receiver),
                Arc::clone(&sink),
                target.clone(),
                config.clone(),
                Arc::clone(&counters),
            ));
        }

        tracing::info!(
            workers = config.workers.max(1),
            queue_capacity = config.queue_capacity.max(1),
            bucket = %target.bucket,
            organization = %target.organization,
            "Write dispatcher started"
        );

        Self {
            inner: Arc::new(Inner {
                sender: RwLock::new(Some(sender)),
                writers: Mutex::new(Some(writers)),
                counters,
                target,
                shutdown_grace: config.shutdown_grace,
            }),
        }
    }

    /// Queues a point for writing without waiting.
    ///
    /// # Errors
    ///
    /// Returns `QueueFull` if the queue is at capacity and `Closed` after
    /// shutdown. In both cases the point is dropped and counted.
    pub fn enqueue(&self, point: Point) -> Result<(), DispatchError> {
        let counters = &self.inner.counters;
        let guard = self
            .inner
            .sender
            .read()
            .map_err(|_| DispatchError::Closed)?;

        let Some(sender) = guard.as_ref() else {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                measurement = %point.measurement(),
                "Write dispatcher closed, dropping point"
            );
            return Err(DispatchError::Closed);
        };

        counters.queued.fetch_add(1, Ordering::SeqCst);
        match sender.try_send(point) {
            Ok(()) => {
                counters.enqueued.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(point)) => {
                counters.queued.fetch_sub(1, Ordering::SeqCst);
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    measurement = %point.measurement(),
                    timestamp = %point.timestamp(),
                    "Write queue full, dropping point"
                );
                Err(DispatchError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                counters.queued.fetch_sub(1, Ordering::SeqCst);
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                Err(DispatchError::Closed)
            }
        }
    }

    /// Returns the bucket and organization points are written to.
    #[must_use]
    pub fn target(&self) -> &WriteTarget {
        &self.inner.target
    }

    /// Returns a snapshot of the dispatcher counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        let counters = &self.inner.counters;
        DispatchStats {
            enqueued: counters.enqueued.load(Ordering::Relaxed),
            written: counters.written.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            dropped: counters.dropped.load(Ordering::Relaxed),
            queued: counters.queued.load(Ordering::SeqCst),
            in_flight: counters.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Stops accepting points and waits for the queue to drain.
    ///
    /// Writers that are still busy when the grace period ends are aborted.
    /// Points left in the queue and points whose write was interrupted are
    /// reported as lost. Calling this more
    /// than once is a no-op.
    pub async fn shutdown(&self) -> DrainReport {
        if let Ok(mut sender) = self.inner.sender.write() {
            sender.take();
        }

        let writers = self
            .inner
            .writers
            .lock()
            .ok()
            .and_then(|mut writers| writers.take());
        let Some(mut writers) = writers else {
            return DrainReport {
                drained: true,
                lost: 0,
            };
        };

        let queued = self.inner.counters.queued.load(Ordering::SeqCst);
        tracing::info!(queued, "Draining write queue");

        let drained =
            tokio::time::timeout(self.inner.shutdown_grace, drain_writers(&mut writers))
                .await
                .is_ok();

        if drained {
            let stats = self.stats();
            tracing::info!(
                written = stats.written,
                failed = stats.failed,
                dropped = stats.dropped,
                "Write queue drained"
            );
            return DrainReport { drained, lost: 0 };
        }

        writers.abort_all();
        while writers.join_next().await.is_some() {}

        let counters = &self.inner.counters;
        let queued = counters.queued.load(Ordering::SeqCst);
        let in_flight = counters.in_flight.load(Ordering::SeqCst);
        let lost = queued + in_flight;
        tracing::error!(
            lost,
            queued,
            in_flight,
            grace_ms = u64::try_from(self.inner.shutdown_grace.as_millis()).unwrap_or(u64::MAX),
            bucket = %self.inner.target.bucket,
            organization = %self.inner.target.organization,
            "Shutdown grace period elapsed, unwritten points lost"
        );
        DrainReport { drained, lost }
    }
}

async fn drain_writers(writers: &mut JoinSet<()>) {
    while let Some(result) = writers.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Writer task failed");
        }
    }
}

async fn run_writer(
    worker: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Point>>>,
    sink: Arc<dyn WriteSink>,
    target: WriteTarget,
    config: DispatchConfig,
    counters: Arc<Counters>,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(point) = next else {
            break;
        };
        counters.in_flight.fetch_add(1, Ordering::SeqCst);
        counters.queued.fetch_sub(1, Ordering::SeqCst);
        write_with_retry(sink.as_ref(), &point, &target, &config, &counters).await;
        counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
    tracing::debug!(worker, "Writer stopped");
}

async fn write_with_retry(
    sink: &dyn WriteSink,
    point: &Point,
    target: &WriteTarget,
    config: &DispatchConfig,
    counters: &Counters,
) {
    let mut attempt: u32 = 0;
    loop {
        match sink.write(point, target).await {
            Ok(()) => {
                counters.written.fetch_add(1, Ordering::Relaxed);
                if attempt > 0 {
                    tracing::debug!(
                        measurement = %point.measurement(),
                        attempts = attempt + 1,
                        "Point written after retry"
                    );
                }
                return;
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay =
                    calculate_backoff_delay(attempt, config.retry_base_delay, config.retry_max_delay);
                attempt += 1;
                tracing::warn!(
                    measurement = %point.measurement(),
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %e,
                    "Retrying point write after failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    measurement = %point.measurement(),
                    timestamp = %point.timestamp(),
                    timestamp_ms = point.timestamp_millis(),
                    bucket = %target.bucket,
                    organization = %target.organization,
                    attempts = attempt + 1,
                    error = %e,
                    "Failed to write point, dropping it"
                );
                return;
            }
        }
    }
}
