// ABOUTME: Per-user monthly budget guard checked before any billable operation
// ABOUTME: Lazily creates the budget row and resets the counter on month rollover
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::UsageBudget;

/// Result of a budget check
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetStatus {
    /// Whether new billable work may start
    pub allowed: bool,
    /// Cents left this month, floored at zero
    pub remaining_cents: i64,
    /// Cents spent this month
    pub used_cents: i64,
    /// Monthly ceiling from the subscription tier
    pub limit_cents: i64,
}

/// Check whether the user is within their monthly budget.
///
/// Creates the budget row on first use (losing a concurrent create
/// falls back to reading the winner's row), zeroes the counter once
/// per calendar month rollover, and syncs the stored limit if the
/// subscription tier changed since the row was written.
///
/// # Errors
///
/// Returns an error if the user does not exist or a query fails.
pub async fn check_budget(db: &Database, user_id: Uuid) -> AppResult<BudgetStatus> {
    check_budget_at(db, user_id, Utc::now()).await
}

/// `check_budget` with an explicit clock.
///
/// # Errors
///
/// Returns an error if the user does not exist or a query fails.
pub async fn check_budget_at(
    db: &Database,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<BudgetStatus> {
    let user = db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let limit_cents = user.tier.monthly_limit_cents();

    let mut budget = match db.get_budget(user_id).await? {
        Some(budget) => budget,
        None => {
            let fresh = UsageBudget {
                user_id,
                monthly_limit_cents: limit_cents,
                current_month_usage_cents: 0,
                last_reset_at: now,
            };
            if db.try_create_budget(&fresh).await? {
                fresh
            } else {
                // Another caller created the row between our read and insert
                db.get_budget(user_id).await?.ok_or_else(|| {
                    AppError::internal("budget row missing after create conflict")
                })?
            }
        }
    };

    // Month rollover: zero the counter exactly once per calendar month
    if budget.last_reset_at.year() != now.year() || budget.last_reset_at.month() != now.month() {
        db.reset_budget_month(user_id, limit_cents, now).await?;
        budget.current_month_usage_cents = 0;
        budget.monthly_limit_cents = limit_cents;
        budget.last_reset_at = now;
    }

    // Tier may have changed since the row was created
    if budget.monthly_limit_cents != limit_cents {
        db.update_budget_limit(user_id, limit_cents).await?;
        budget.monthly_limit_cents = limit_cents;
    }

    let used_cents = budget.current_month_usage_cents;
    Ok(BudgetStatus {
        allowed: used_cents < limit_cents,
        remaining_cents: (limit_cents - used_cents).max(0),
        used_cents,
        limit_cents,
    })
}
