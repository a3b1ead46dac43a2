// ABOUTME: Worker pool consuming episode jobs with bounded retries and backoff
// ABOUTME: Workers exit once the queue channel closes and all jobs are drained
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::queue::{EpisodeJob, RetryPolicy};
use crate::errors::AppResult;

/// Processes one job; errors trigger a retry up to the policy's limit
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Handle one job delivery.
    async fn handle(&self, job: EpisodeJob) -> AppResult<()>;
}

/// Fixed-size pool of workers sharing one queue receiver
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `concurrency` workers consuming `receiver`.
    #[must_use]
    pub fn spawn(
        receiver: mpsc::Receiver<EpisodeJob>,
        handler: Arc<dyn JobHandler>,
        concurrency: usize,
        retry: RetryPolicy,
    ) -> Self {
        let receiver = Arc::new(Mutex::new(receiver));
        let handles = (0..concurrency)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    worker_loop(worker, receiver, handler, retry).await;
                })
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to finish. Call after dropping the queue.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task panicked");
            }
        }
    }
}

async fn worker_loop(
    worker: usize,
    receiver: Arc<Mutex<mpsc::Receiver<EpisodeJob>>>,
    handler: Arc<dyn JobHandler>,
    retry: RetryPolicy,
) {
    debug!(worker, "worker started");
    loop {
        // Lock only long enough to take one job
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            debug!(worker, "queue closed, worker stopping");
            return;
        };
        run_with_retries(worker, job, handler.as_ref(), retry).await;
    }
}

async fn run_with_retries(
    worker: usize,
    job: EpisodeJob,
    handler: &dyn JobHandler,
    retry: RetryPolicy,
) {
    for attempt in 1..=retry.max_attempts.max(1) {
        match handler.handle(job).await {
            Ok(()) => {
                info!(worker, episode_id = %job.episode_id, attempt, "job finished");
                return;
            }
            Err(e) if attempt < retry.max_attempts => {
                let delay = retry.backoff(attempt - 1);
                warn!(
                    worker,
                    episode_id = %job.episode_id,
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis(),
                    "job failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(
                    worker,
                    episode_id = %job.episode_id,
                    attempt,
                    error = %e,
                    "job failed, abandoning after final attempt"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::errors::AppError;
    use crate::jobs::queue::{InMemoryQueue, JobQueue};
    use uuid::Uuid;

    struct CountingHandler {
        calls: AtomicU32,
        fail_first: u32,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, _job: EpisodeJob) -> AppResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(AppError::internal("transient failure"))
            } else {
                Ok(())
            }
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn job() -> EpisodeJob {
        EpisodeJob {
            episode_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_job_retried_until_success() {
        let (queue, rx) = InMemoryQueue::new(4);
        let handler = Arc::new(CountingHandler {
            calls: AtomicU32::new(0),
            fail_first: 2,
        });
        let pool = WorkerPool::spawn(rx, Arc::clone(&handler) as _, 1, fast_retry());

        queue.enqueue(job()).await.unwrap();
        drop(queue);
        pool.join().await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_job_abandoned_after_max_attempts() {
        let (queue, rx) = InMemoryQueue::new(4);
        let handler = Arc::new(CountingHandler {
            calls: AtomicU32::new(0),
            fail_first: u32::MAX,
        });
        let pool = WorkerPool::spawn(rx, Arc::clone(&handler) as _, 1, fast_retry());

        queue.enqueue(job()).await.unwrap();
        drop(queue);
        pool.join().await;

        // Exactly max_attempts deliveries, then abandoned
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pool_drains_queue_across_workers() {
        let (queue, rx) = InMemoryQueue::new(16);
        let handler = Arc::new(CountingHandler {
            calls: AtomicU32::new(0),
            fail_first: 0,
        });
        let pool = WorkerPool::spawn(rx, Arc::clone(&handler) as _, 2, fast_retry());

        for _ in 0..8 {
            queue.enqueue(job()).await.unwrap();
        }
        drop(queue);
        pool.join().await;

        assert_eq!(handler.calls.load(Ordering::SeqCst), 8);
    }
}
