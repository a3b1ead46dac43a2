// ABOUTME: Episode job type, queue trait, retry policy, and the in-process queue
// ABOUTME: Backoff is exponential from a configurable base delay
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::errors::{AppError, AppResult, ErrorCode};

/// One unit of background work: process an episode for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeJob {
    pub episode_id: Uuid,
    pub user_id: Uuid,
}

/// Retry behavior for failed jobs
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total delivery attempts before a job is abandoned
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based): `base * 2^retry`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(5_000),
        }
    }
}

/// Submission side of the job queue
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job for background processing.
    async fn enqueue(&self, job: EpisodeJob) -> AppResult<()>;
}

/// In-process queue backed by a bounded tokio channel.
///
/// Dropping every clone of the queue closes the channel, which is how
/// the composition root signals workers to drain and stop.
#[derive(Clone)]
pub struct InMemoryQueue {
    tx: mpsc::Sender<EpisodeJob>,
}

impl InMemoryQueue {
    /// Create a queue and the receiver the worker pool consumes.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EpisodeJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, job: EpisodeJob) -> AppResult<()> {
        self.tx.send(job).await.map_err(|_| {
            AppError::new(ErrorCode::ServiceUnavailable, "job queue is shut down")
        })
    }
}
