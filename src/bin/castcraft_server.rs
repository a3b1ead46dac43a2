// ABOUTME: CastCraft server binary: composition root and graceful shutdown
// ABOUTME: Wires database, providers, storage, workers, and the HTTP router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use castcraft::ai::{OpenAiProvider, WhisperProvider};
use castcraft::auth::AuthManager;
use castcraft::config::ServerConfig;
use castcraft::database::Database;
use castcraft::jobs::{InMemoryQueue, RetryPolicy, WorkerPool};
use castcraft::logging;
use castcraft::media::HttpMediaResolver;
use castcraft::pipeline::EpisodeProcessor;
use castcraft::routes::{self, AppState};
use castcraft::storage::S3Storage;
use castcraft::style::StyleLearner;
use castcraft::usage::GlobalLimits;

/// Pending jobs held in the in-process queue before enqueue backpressure
const QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let config = ServerConfig::from_env()?;

    let db = Database::new(&config.database_url).await?;
    db.migrate().await?;
    info!(database_url = %config.database_url, "database ready");

    let chat = Arc::new(OpenAiProvider::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.chat_model.clone(),
    )?);
    let transcriber = Arc::new(WhisperProvider::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.transcription_model.clone(),
    )?);
    let storage = Arc::new(S3Storage::new(&config.storage)?);
    let media = Arc::new(HttpMediaResolver::new(
        storage.clone(),
        config.max_download_bytes,
    ));

    let global_limits = GlobalLimits {
        hourly_limit_cents: config.global_hourly_limit_cents,
        daily_limit_cents: config.global_daily_limit_cents,
    };
    let style_learner = Arc::new(StyleLearner::new(db.clone(), chat.clone()));
    let processor = Arc::new(EpisodeProcessor::new(
        db.clone(),
        chat,
        transcriber,
        media,
        style_learner,
        global_limits,
    ));

    let (queue, receiver) = InMemoryQueue::new(QUEUE_CAPACITY);
    let workers = WorkerPool::spawn(
        receiver,
        processor,
        config.worker_concurrency,
        RetryPolicy {
            max_attempts: config.job_max_attempts,
            base_delay: config.job_backoff_base,
        },
    );
    info!(concurrency = config.worker_concurrency, "worker pool started");

    let state = AppState {
        db,
        auth: AuthManager::new(config.jwt_secret.clone()),
        queue: Arc::new(queue.clone()),
        storage,
        global_limits,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!(port = config.http_port, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close the queue so workers drain remaining jobs and stop
    drop(queue);
    workers.join().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut signal) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            signal.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
