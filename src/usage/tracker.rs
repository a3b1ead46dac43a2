// ABOUTME: Usage metering: computes costs and appends ledger rows with budget updates
// ABOUTME: Unpriced models are skipped rather than billed at a guessed rate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::pricing::{chat_cost_cents, chat_pricing, transcription_cost_cents};
use crate::ai::TokenUsage;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{SubscriptionTier, UsageOperation, UsageRecord};

async fn fallback_limit_cents(db: &Database, user_id: Uuid) -> AppResult<i64> {
    let tier = db
        .get_user(user_id)
        .await?
        .map_or(SubscriptionTier::Free, |u| u.tier);
    Ok(tier.monthly_limit_cents())
}

/// Meter a chat completion: cost from token counts, ledger row, budget bump.
///
/// Models without a pricing entry are logged and skipped.
///
/// # Errors
///
/// Returns an error if the ledger transaction fails.
pub async fn record_chat_usage(
    db: &Database,
    user_id: Uuid,
    episode_id: Option<Uuid>,
    operation: UsageOperation,
    model: &str,
    usage: TokenUsage,
) -> AppResult<()> {
    let Some(pricing) = chat_pricing(model) else {
        debug!(model, "no pricing entry, skipping usage tracking");
        return Ok(());
    };

    let cost_cents = chat_cost_cents(pricing, usage.input_tokens, usage.output_tokens);
    let record = UsageRecord {
        id: Uuid::new_v4(),
        user_id,
        episode_id,
        operation,
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        cost_cents,
        model: model.to_owned(),
        created_at: Utc::now(),
    };

    let fallback = fallback_limit_cents(db, user_id).await?;
    db.record_usage(&record, fallback).await?;

    debug!(
        %user_id,
        operation = %operation,
        cost_cents,
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "recorded chat usage"
    );
    Ok(())
}

/// Meter a transcription: cost from audio duration, ledger row, budget bump.
///
/// # Errors
///
/// Returns an error if the ledger transaction fails.
pub async fn record_transcription_usage(
    db: &Database,
    user_id: Uuid,
    episode_id: Option<Uuid>,
    model: &str,
    duration_seconds: i64,
) -> AppResult<()> {
    let cost_cents = transcription_cost_cents(duration_seconds);
    let record = UsageRecord {
        id: Uuid::new_v4(),
        user_id,
        episode_id,
        operation: UsageOperation::Transcription,
        input_tokens: 0,
        output_tokens: 0,
        cost_cents,
        model: model.to_owned(),
        created_at: Utc::now(),
    };

    let fallback = fallback_limit_cents(db, user_id).await?;
    db.record_usage(&record, fallback).await?;

    debug!(%user_id, cost_cents, duration_seconds, "recorded transcription usage");
    Ok(())
}
