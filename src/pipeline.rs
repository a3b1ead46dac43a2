// ABOUTME: Episode processing orchestrator: gates, stages, and failure policy
// ABOUTME: Policy stops mark FAILED and return; stage faults mark FAILED and re-raise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::ai::{analyze, generate, ChatProvider, Transcript, TranscriptionProvider};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::jobs::{EpisodeJob, JobHandler};
use crate::media::MediaSource;
use crate::models::{ContentPiece, Episode, EpisodeStatus, PieceStatus, UsageOperation};
use crate::sanitize::clean_error_message;
use crate::style::StyleLearner;
use crate::usage::{
    check_budget, check_global_limits, record_chat_usage, record_transcription_usage, GlobalLimits,
};

/// Fixed user-facing message for unverified accounts
pub const UNVERIFIED_MESSAGE: &str =
    "Please verify your email address before processing episodes.";

/// Fixed user-facing message when the global circuit breaker is open
pub const CAPACITY_MESSAGE: &str =
    "Processing is temporarily paused due to high platform load. Please try again later.";

/// Fixed user-facing message when the monthly budget is exhausted
pub const BUDGET_MESSAGE: &str =
    "Monthly processing budget reached. Upgrade your plan or wait for the next billing month.";

// Coarse progress checkpoints polled by the UI
const PROGRESS_STARTED: i64 = 5;
const PROGRESS_TRANSCRIBED: i64 = 30;
const PROGRESS_ANALYZED: i64 = 55;
const PROGRESS_GENERATED: i64 = 85;
const PROGRESS_PERSISTED: i64 = 95;

// How a stage run ended when no fault was raised
enum StageOutcome {
    Completed,
    BudgetExhausted,
}

/// Drives one episode through transcription, analysis, and generation
pub struct EpisodeProcessor {
    db: Database,
    chat: Arc<dyn ChatProvider>,
    transcriber: Arc<dyn TranscriptionProvider>,
    media: Arc<dyn MediaSource>,
    style_learner: Arc<StyleLearner>,
    global_limits: GlobalLimits,
}

impl EpisodeProcessor {
    #[must_use]
    pub fn new(
        db: Database,
        chat: Arc<dyn ChatProvider>,
        transcriber: Arc<dyn TranscriptionProvider>,
        media: Arc<dyn MediaSource>,
        style_learner: Arc<StyleLearner>,
        global_limits: GlobalLimits,
    ) -> Self {
        Self {
            db,
            chat,
            transcriber,
            media,
            style_learner,
            global_limits,
        }
    }

    /// Process one episode end to end.
    ///
    /// Policy stops (unverified email, open breaker, exhausted budget)
    /// mark the episode FAILED with a fixed message and return `Ok` so
    /// the queue does not retry a deliberate rejection. The budget is
    /// re-checked before every paid stage, so a transcription that
    /// overshoots the limit stops the episode before analysis runs.
    /// Stage faults mark FAILED with a sanitized message and re-raise
    /// for retry; a retry resumes from the last persisted stage.
    ///
    /// # Errors
    ///
    /// Returns an error for missing or foreign episodes and for any
    /// stage fault.
    pub async fn process(&self, episode_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let episode = self
            .db
            .get_episode(episode_id)
            .await?
            .ok_or_else(|| AppError::not_found("Episode"))?;
        if episode.user_id != user_id {
            return Err(AppError::permission_denied(
                "Episode belongs to another user",
            ));
        }

        // Queues redeliver; a finished episode must not be reprocessed
        if episode.status == EpisodeStatus::Complete {
            debug!(%episode_id, "episode already complete, skipping redelivery");
            return Ok(());
        }

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        if !user.email_verified {
            self.db
                .mark_episode_failed(episode_id, UNVERIFIED_MESSAGE)
                .await?;
            return Ok(());
        }

        let breaker = check_global_limits(&self.db, self.global_limits, Utc::now()).await?;
        if !breaker.allowed {
            self.db
                .mark_episode_failed(episode_id, CAPACITY_MESSAGE)
                .await?;
            return Ok(());
        }

        let budget = check_budget(&self.db, user_id).await?;
        if !budget.allowed {
            self.db
                .mark_episode_failed(episode_id, BUDGET_MESSAGE)
                .await?;
            return Ok(());
        }

        match self.run_stages(&episode).await {
            Ok(StageOutcome::Completed) => {
                info!(%episode_id, "episode processed");
                Ok(())
            }
            Ok(StageOutcome::BudgetExhausted) => {
                self.db
                    .mark_episode_failed(episode_id, BUDGET_MESSAGE)
                    .await?;
                Ok(())
            }
            Err(e) => {
                let message = clean_error_message(&e.to_string());
                if let Err(mark_err) = self.db.mark_episode_failed(episode_id, &message).await {
                    error!(%episode_id, error = %mark_err, "failed to mark episode FAILED");
                }
                Err(e)
            }
        }
    }

    async fn run_stages(&self, episode: &Episode) -> AppResult<StageOutcome> {
        let episode_id = episode.id;
        let user_id = episode.user_id;

        // Stage 1: transcription. Text and duration are persisted the
        // moment they exist so a later stage failure cannot lose them,
        // and a retried episode resumes here instead of re-transcribing.
        let transcript = match (&episode.transcription, episode.duration_seconds) {
            (Some(text), Some(duration_seconds)) if !text.is_empty() => {
                debug!(%episode_id, "transcript already persisted, resuming from analysis");
                Transcript {
                    text: text.clone(),
                    duration_seconds,
                }
            }
            _ => {
                self.db
                    .update_episode_status(episode_id, EpisodeStatus::Transcribing)
                    .await?;
                self.db
                    .update_episode_progress(episode_id, PROGRESS_STARTED)
                    .await?;

                let media = self.media.fetch(user_id, &episode.source).await?;
                let transcript = self
                    .transcriber
                    .transcribe(&media.file_name, media.bytes)
                    .await?;
                self.db
                    .save_transcription(episode_id, &transcript.text, transcript.duration_seconds)
                    .await?;
                record_transcription_usage(
                    &self.db,
                    user_id,
                    Some(episode_id),
                    self.transcriber.model(),
                    transcript.duration_seconds,
                )
                .await?;
                self.db
                    .update_episode_progress(episode_id, PROGRESS_TRANSCRIBED)
                    .await?;
                transcript
            }
        };

        // Stage 2: analysis. Transcription spend may have exhausted the
        // budget, so the guard runs again before the next paid call.
        if !check_budget(&self.db, user_id).await?.allowed {
            return Ok(StageOutcome::BudgetExhausted);
        }
        self.db
            .update_episode_status(episode_id, EpisodeStatus::Analyzing)
            .await?;
        let (analysis, analysis_usage) =
            analyze::analyze_transcript(self.chat.as_ref(), &episode.title, &transcript.text)
                .await?;
        record_chat_usage(
            &self.db,
            user_id,
            Some(episode_id),
            UsageOperation::Analysis,
            self.chat.model(),
            analysis_usage,
        )
        .await?;
        self.db
            .update_episode_progress(episode_id, PROGRESS_ANALYZED)
            .await?;

        // Stage 3: generation, conditioned on the style profile if one exists
        if !check_budget(&self.db, user_id).await?.allowed {
            return Ok(StageOutcome::BudgetExhausted);
        }
        self.db
            .update_episode_status(episode_id, EpisodeStatus::Generating)
            .await?;
        let style_profile = self.db.get_style_profile(user_id).await?;
        let (generated, generation_usage) = generate::generate_content(
            self.chat.as_ref(),
            &analysis,
            &episode.title,
            &transcript.text,
            style_profile.as_ref(),
        )
        .await?;
        record_chat_usage(
            &self.db,
            user_id,
            Some(episode_id),
            UsageOperation::Generation,
            self.chat.model(),
            generation_usage,
        )
        .await?;
        self.db
            .update_episode_progress(episode_id, PROGRESS_GENERATED)
            .await?;

        let now = Utc::now();
        let pieces: Vec<ContentPiece> = generated
            .into_iter()
            .map(|piece| ContentPiece {
                id: Uuid::new_v4(),
                episode_id,
                user_id,
                platform: piece.platform,
                content_type: piece.content_type,
                content: piece.content,
                order_index: piece.order,
                status: PieceStatus::Generated,
                created_at: now,
                updated_at: now,
            })
            .collect();
        // A crash between insert and the terminal mark redelivers the
        // episode; clearing first keeps the insert idempotent.
        self.db.delete_content_pieces(episode_id).await?;
        self.db.insert_content_pieces(&pieces).await?;
        self.db
            .update_episode_progress(episode_id, PROGRESS_PERSISTED)
            .await?;

        // Stage 4: terminal success
        self.db.mark_episode_complete(episode_id).await?;

        // Best-effort learner; its outcome never touches this episode
        let learner = Arc::clone(&self.style_learner);
        tokio::spawn(async move {
            learner.update_profile(user_id, Some(episode_id)).await;
        });

        Ok(StageOutcome::Completed)
    }
}

#[async_trait]
impl JobHandler for EpisodeProcessor {
    async fn handle(&self, job: EpisodeJob) -> AppResult<()> {
        self.process(job.episode_id, job.user_id).await
    }
}
