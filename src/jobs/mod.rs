// ABOUTME: Background job plumbing: queue trait, retry policy, and worker pool
// ABOUTME: Queue and workers are constructed and owned by the composition root
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

/// Job type, queue trait, and the in-process channel queue
pub mod queue;
/// Worker pool consuming the queue with retry and backoff
pub mod worker;

pub use queue::{EpisodeJob, InMemoryQueue, JobQueue, RetryPolicy};
pub use worker::{JobHandler, WorkerPool};
