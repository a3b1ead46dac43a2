// ABOUTME: SQLite persistence layer for users, episodes, content, style, and usage
// ABOUTME: Usage ledger append and budget increment run in a single transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{
    ContentPiece, ContentType, Episode, EpisodeSource, EpisodeStatus, PieceStatus, Platform,
    StyleProfile, SubscriptionTier, Tone, UsageBudget, UsageRecord, User,
};

/// Database connection pool and typed query methods
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (and create if missing) the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // In-memory databases are per-connection; keep the pool at one
        // connection so every query sees the same schema.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Run schema setup.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                email_verified INTEGER NOT NULL DEFAULT 0,
                verification_token TEXT,
                tier TEXT NOT NULL DEFAULT 'FREE',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS episodes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                source_kind TEXT NOT NULL,
                source_locator TEXT NOT NULL,
                status TEXT NOT NULL,
                progress INTEGER NOT NULL DEFAULT 0,
                transcription TEXT,
                duration_seconds INTEGER,
                error_message TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                processed_at DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_user ON episodes(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS content_pieces (
                id TEXT PRIMARY KEY,
                episode_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                content_type TEXT NOT NULL,
                content TEXT NOT NULL,
                order_index INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'GENERATED',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_pieces_episode ON content_pieces(episode_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_content_pieces_user ON content_pieces(user_id, updated_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS usage_records (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                episode_id TEXT,
                operation TEXT NOT NULL,
                input_tokens INTEGER NOT NULL DEFAULT 0,
                output_tokens INTEGER NOT NULL DEFAULT 0,
                cost_cents INTEGER NOT NULL CHECK (cost_cents >= 0),
                model TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_usage_records_created ON usage_records(created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS usage_budgets (
                user_id TEXT PRIMARY KEY,
                monthly_limit_cents INTEGER NOT NULL,
                current_month_usage_cents INTEGER NOT NULL DEFAULT 0,
                last_reset_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS style_profiles (
                user_id TEXT PRIMARY KEY,
                tone TEXT NOT NULL,
                vocabulary TEXT NOT NULL,
                hook_patterns TEXT NOT NULL,
                platform_preferences TEXT NOT NULL,
                manual_overrides TEXT NOT NULL,
                sample_count INTEGER NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ================================
    // Users
    // ================================

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the insert fails.
    pub async fn create_user(&self, user: &User, verification_token: &str) -> Result<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, password_hash, email_verified, verification_token, tier, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.email_verified)
        .bind(verification_token)
        .bind(user.tier.to_string())
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(user.id)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, email_verified, tier, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| user_from_row(&r)).transpose()
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, email_verified, tier, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| user_from_row(&r)).transpose()
    }

    /// Change a user's subscription tier (billing webhook / admin action).
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_user_tier(&self, user_id: Uuid, tier: SubscriptionTier) -> Result<()> {
        sqlx::query("UPDATE users SET tier = $1 WHERE id = $2")
            .bind(tier.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Verify the email behind `token`; returns the user id on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn verify_email(&self, token: &str) -> Result<Option<Uuid>> {
        let row = sqlx::query("SELECT id FROM users WHERE verification_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let id: String = row.get("id");
        sqlx::query(
            "UPDATE users SET email_verified = 1, verification_token = NULL WHERE id = $1",
        )
        .bind(&id)
        .execute(&self.pool)
        .await?;
        Ok(Some(Uuid::parse_str(&id)?))
    }

    /// Mark a user's email verified directly (test and admin use).
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_email_verified(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET email_verified = 1, verification_token = NULL WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ================================
    // Episodes
    // ================================

    /// Insert a new episode.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_episode(&self, episode: &Episode) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO episodes (
                id, user_id, title, source_kind, source_locator, status, progress,
                transcription, duration_seconds, error_message, created_at, processed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(episode.id.to_string())
        .bind(episode.user_id.to_string())
        .bind(&episode.title)
        .bind(episode.source.kind_str())
        .bind(episode.source.locator())
        .bind(episode.status.to_string())
        .bind(episode.progress)
        .bind(&episode.transcription)
        .bind(episode.duration_seconds)
        .bind(&episode.error_message)
        .bind(episode.created_at)
        .bind(episode.processed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get an episode by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn get_episode(&self, episode_id: Uuid) -> Result<Option<Episode>> {
        let row = sqlx::query("SELECT * FROM episodes WHERE id = $1")
            .bind(episode_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| episode_from_row(&r)).transpose()
    }

    /// List a user's episodes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn list_episodes(&self, user_id: Uuid) -> Result<Vec<Episode>> {
        let rows = sqlx::query("SELECT * FROM episodes WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(episode_from_row).collect()
    }

    /// Update the processing status.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_episode_status(&self, episode_id: Uuid, status: EpisodeStatus) -> Result<()> {
        sqlx::query("UPDATE episodes SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(episode_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update the coarse progress percentage polled by the UI.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_episode_progress(&self, episode_id: Uuid, progress: i64) -> Result<()> {
        sqlx::query("UPDATE episodes SET progress = $1 WHERE id = $2")
            .bind(progress)
            .bind(episode_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Persist transcription output; survives later stage failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn save_transcription(
        &self,
        episode_id: Uuid,
        text: &str,
        duration_seconds: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE episodes SET transcription = $1, duration_seconds = $2 WHERE id = $3")
            .bind(text)
            .bind(duration_seconds)
            .bind(episode_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Terminal success: status COMPLETE, progress 100, processed timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_episode_complete(&self, episode_id: Uuid) -> Result<()> {
        sqlx::query(
            r"
            UPDATE episodes
            SET status = 'COMPLETE', progress = 100, error_message = NULL,
                processed_at = CURRENT_TIMESTAMP
            WHERE id = $1
            ",
        )
        .bind(episode_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal failure with a pre-sanitized message.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_episode_failed(&self, episode_id: Uuid, message: &str) -> Result<()> {
        sqlx::query("UPDATE episodes SET status = 'FAILED', error_message = $1 WHERE id = $2")
            .bind(message)
            .bind(episode_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Reset a FAILED episode for reprocessing: discards generated content,
    /// clears the error, and re-enters the initial status in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement in the transaction fails.
    pub async fn reset_episode_for_reprocess(
        &self,
        episode_id: Uuid,
        initial_status: EpisodeStatus,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM content_pieces WHERE episode_id = $1")
            .bind(episode_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r"
            UPDATE episodes
            SET status = $1, progress = 0, error_message = NULL, processed_at = NULL
            WHERE id = $2
            ",
        )
        .bind(initial_status.to_string())
        .bind(episode_id.to_string())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete an episode and its content pieces and usage records.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement in the transaction fails.
    pub async fn delete_episode(&self, episode_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM content_pieces WHERE episode_id = $1")
            .bind(episode_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM usage_records WHERE episode_id = $1")
            .bind(episode_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM episodes WHERE id = $1")
            .bind(episode_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Count a user's COMPLETE episodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_complete_episodes(&self, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM episodes WHERE user_id = $1 AND status = 'COMPLETE'",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // ================================
    // Content pieces
    // ================================

    /// Bulk insert generated pieces in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails.
    pub async fn insert_content_pieces(&self, pieces: &[ContentPiece]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for piece in pieces {
            sqlx::query(
                r"
                INSERT INTO content_pieces (
                    id, episode_id, user_id, platform, content_type, content,
                    order_index, status, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                ",
            )
            .bind(piece.id.to_string())
            .bind(piece.episode_id.to_string())
            .bind(piece.user_id.to_string())
            .bind(piece.platform.to_string())
            .bind(piece.content_type.to_string())
            .bind(&piece.content)
            .bind(piece.order_index)
            .bind(piece.status.to_string())
            .bind(piece.created_at)
            .bind(piece.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Delete all pieces for an episode.
    ///
    /// Retried generation runs clear prior output before inserting so a
    /// redelivery can never duplicate pieces.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_content_pieces(&self, episode_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM content_pieces WHERE episode_id = $1")
            .bind(episode_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List an episode's pieces in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn list_content_pieces(&self, episode_id: Uuid) -> Result<Vec<ContentPiece>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM content_pieces
            WHERE episode_id = $1
            ORDER BY platform, content_type, order_index
            ",
        )
        .bind(episode_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(content_piece_from_row).collect()
    }

    /// Count an episode's pieces.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_content_pieces(&self, episode_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM content_pieces WHERE episode_id = $1")
            .bind(episode_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recently updated pieces for a user, for style sampling.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn recent_content_pieces(&self, user_id: Uuid, limit: i64) -> Result<Vec<ContentPiece>> {
        let rows = sqlx::query(
            "SELECT * FROM content_pieces WHERE user_id = $1 ORDER BY updated_at DESC LIMIT $2",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(content_piece_from_row).collect()
    }

    /// Update a piece's lifecycle status and bump its updated timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_content_piece_status(&self, piece_id: Uuid, status: PieceStatus) -> Result<()> {
        sqlx::query(
            "UPDATE content_pieces SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(status.to_string())
        .bind(piece_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ================================
    // Usage ledger and budgets
    // ================================

    /// Append a ledger row and increment the owner's budget counter atomically.
    ///
    /// The budget row normally exists because `check_budget` runs before any
    /// billable call; if it is missing, one is created inside the same
    /// transaction with `fallback_limit_cents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; neither write is applied.
    pub async fn record_usage(&self, record: &UsageRecord, fallback_limit_cents: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO usage_records (
                id, user_id, episode_id, operation, input_tokens, output_tokens,
                cost_cents, model, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.episode_id.map(|id| id.to_string()))
        .bind(record.operation.to_string())
        .bind(record.input_tokens)
        .bind(record.output_tokens)
        .bind(record.cost_cents)
        .bind(&record.model)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r"
            UPDATE usage_budgets
            SET current_month_usage_cents = current_month_usage_cents + $1
            WHERE user_id = $2
            ",
        )
        .bind(record.cost_cents)
        .bind(record.user_id.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r"
                INSERT INTO usage_budgets (user_id, monthly_limit_cents, current_month_usage_cents, last_reset_at)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(record.user_id.to_string())
            .bind(fallback_limit_cents)
            .bind(record.cost_cents)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Sum ledger costs across all users since `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn sum_usage_cost_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(cost_cents), 0) FROM usage_records WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Count ledger rows for one episode.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn count_usage_records_for_episode(&self, episode_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM usage_records WHERE episode_id = $1")
            .bind(episode_id.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Get a user's budget row.
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn get_budget(&self, user_id: Uuid) -> Result<Option<UsageBudget>> {
        let row = sqlx::query("SELECT * FROM usage_budgets WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| budget_from_row(&r)).transpose()
    }

    /// Create a budget row; returns false if another caller created it first.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than a unique-constraint conflict.
    pub async fn try_create_budget(&self, budget: &UsageBudget) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO usage_budgets (user_id, monthly_limit_cents, current_month_usage_cents, last_reset_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(budget.user_id.to_string())
        .bind(budget.monthly_limit_cents)
        .bind(budget.current_month_usage_cents)
        .bind(budget.last_reset_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Zero the counter for a new calendar month and sync the tier limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn reset_budget_month(
        &self,
        user_id: Uuid,
        limit_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE usage_budgets
            SET current_month_usage_cents = 0, monthly_limit_cents = $1, last_reset_at = $2
            WHERE user_id = $3
            ",
        )
        .bind(limit_cents)
        .bind(now)
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Sync the stored limit after a subscription change.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_budget_limit(&self, user_id: Uuid, limit_cents: i64) -> Result<()> {
        sqlx::query("UPDATE usage_budgets SET monthly_limit_cents = $1 WHERE user_id = $2")
            .bind(limit_cents)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ================================
    // Style profiles
    // ================================

    /// Get a user's style profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the query, row decoding, or JSON parsing fails.
    pub async fn get_style_profile(&self, user_id: Uuid) -> Result<Option<StyleProfile>> {
        let row = sqlx::query("SELECT * FROM style_profiles WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| style_profile_from_row(&r)).transpose()
    }

    /// Insert or replace the single profile row for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization or the upsert fails.
    pub async fn upsert_style_profile(&self, profile: &StyleProfile) -> Result<()> {
        let vocabulary = serde_json::to_string(&profile.vocabulary)?;
        let hook_patterns = serde_json::to_string(&profile.hook_patterns)?;
        let platform_preferences = serde_json::to_string(&profile.platform_preferences)?;
        let manual_overrides = serde_json::to_string(&profile.manual_overrides)?;

        sqlx::query(
            r"
            INSERT INTO style_profiles (
                user_id, tone, vocabulary, hook_patterns, platform_preferences,
                manual_overrides, sample_count, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT(user_id) DO UPDATE SET
                tone = $2,
                vocabulary = $3,
                hook_patterns = $4,
                platform_preferences = $5,
                manual_overrides = $6,
                sample_count = $7,
                updated_at = $8
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(tone_str(profile.tone))
        .bind(vocabulary)
        .bind(hook_patterns)
        .bind(platform_preferences)
        .bind(manual_overrides)
        .bind(profile.sample_count)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");
    let tier: String = row.get("tier");
    Ok(User {
        id: Uuid::parse_str(&id)?,
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        email_verified: row.get("email_verified"),
        tier: tier.parse()?,
        created_at: row.get("created_at"),
    })
}

fn episode_from_row(row: &SqliteRow) -> Result<Episode> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let source_kind: String = row.get("source_kind");
    let source_locator: String = row.get("source_locator");
    let status: String = row.get("status");
    Ok(Episode {
        id: Uuid::parse_str(&id)?,
        user_id: Uuid::parse_str(&user_id)?,
        title: row.get("title"),
        source: EpisodeSource::from_parts(&source_kind, &source_locator)?,
        status: status.parse()?,
        progress: row.get("progress"),
        transcription: row.get("transcription"),
        duration_seconds: row.get("duration_seconds"),
        error_message: row.get("error_message"),
        created_at: row.get("created_at"),
        processed_at: row.get("processed_at"),
    })
}

fn content_piece_from_row(row: &SqliteRow) -> Result<ContentPiece> {
    let id: String = row.get("id");
    let episode_id: String = row.get("episode_id");
    let user_id: String = row.get("user_id");
    let platform: String = row.get("platform");
    let content_type: String = row.get("content_type");
    let status: String = row.get("status");
    Ok(ContentPiece {
        id: Uuid::parse_str(&id)?,
        episode_id: Uuid::parse_str(&episode_id)?,
        user_id: Uuid::parse_str(&user_id)?,
        platform: platform.parse::<Platform>()?,
        content_type: content_type.parse::<ContentType>()?,
        content: row.get("content"),
        order_index: row.get("order_index"),
        status: status.parse::<PieceStatus>()?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<UsageBudget> {
    let user_id: String = row.get("user_id");
    Ok(UsageBudget {
        user_id: Uuid::parse_str(&user_id)?,
        monthly_limit_cents: row.get("monthly_limit_cents"),
        current_month_usage_cents: row.get("current_month_usage_cents"),
        last_reset_at: row.get("last_reset_at"),
    })
}

fn style_profile_from_row(row: &SqliteRow) -> Result<StyleProfile> {
    let user_id: String = row.get("user_id");
    let tone: String = row.get("tone");
    let vocabulary: String = row.get("vocabulary");
    let hook_patterns: String = row.get("hook_patterns");
    let platform_preferences: String = row.get("platform_preferences");
    let manual_overrides: String = row.get("manual_overrides");
    Ok(StyleProfile {
        user_id: Uuid::parse_str(&user_id)?,
        tone: parse_tone(&tone)?,
        vocabulary: serde_json::from_str(&vocabulary)?,
        hook_patterns: serde_json::from_str(&hook_patterns)?,
        platform_preferences: serde_json::from_str(&platform_preferences)?,
        manual_overrides: serde_json::from_str(&manual_overrides)?,
        sample_count: row.get("sample_count"),
        updated_at: row.get("updated_at"),
    })
}

const fn tone_str(tone: Tone) -> &'static str {
    match tone {
        Tone::Casual => "casual",
        Tone::Professional => "professional",
        Tone::Mixed => "mixed",
    }
}

fn parse_tone(s: &str) -> Result<Tone> {
    match s {
        "casual" => Ok(Tone::Casual),
        "professional" => Ok(Tone::Professional),
        "mixed" => Ok(Tone::Mixed),
        other => Err(anyhow!("unknown tone: {other}")),
    }
}
