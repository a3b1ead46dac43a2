// ABOUTME: Global spend circuit breaker over trailing hourly and daily windows
// ABOUTME: Sums the ledger across ALL users; no persistent breaker state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::warn;

use crate::database::Database;
use crate::errors::AppResult;

/// Platform-wide spend ceilings in cents
#[derive(Debug, Clone, Copy)]
pub struct GlobalLimits {
    pub hourly_limit_cents: i64,
    pub daily_limit_cents: i64,
}

/// Which trailing window tripped the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakerWindow {
    Hourly,
    Daily,
}

/// Result of a breaker check
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GlobalLimitStatus {
    /// Whether new processing jobs may start
    pub allowed: bool,
    /// The window that tripped, when not allowed
    pub reason: Option<BreakerWindow>,
    /// Total spend across all users over the trailing hour
    pub hourly_cost_cents: i64,
    /// Total spend across all users over the trailing 24 hours
    pub daily_cost_cents: i64,
}

/// Check the global spend circuit breaker.
///
/// Last line of defence: even if a per-user budget check has a bug,
/// total API spend cannot exceed the configured caps. The hourly window
/// is checked first, so a trip that exceeds both reports `Hourly`.
///
/// # Errors
///
/// Returns an error if a ledger aggregation fails.
pub async fn check_global_limits(
    db: &Database,
    limits: GlobalLimits,
    now: DateTime<Utc>,
) -> AppResult<GlobalLimitStatus> {
    let hourly_cost_cents = db.sum_usage_cost_since(now - Duration::hours(1)).await?;
    let daily_cost_cents = db.sum_usage_cost_since(now - Duration::hours(24)).await?;

    if hourly_cost_cents >= limits.hourly_limit_cents {
        warn!(
            hourly_cost_cents,
            limit_cents = limits.hourly_limit_cents,
            "circuit breaker: hourly cost limit reached"
        );
        return Ok(GlobalLimitStatus {
            allowed: false,
            reason: Some(BreakerWindow::Hourly),
            hourly_cost_cents,
            daily_cost_cents,
        });
    }

    if daily_cost_cents >= limits.daily_limit_cents {
        warn!(
            daily_cost_cents,
            limit_cents = limits.daily_limit_cents,
            "circuit breaker: daily cost limit reached"
        );
        return Ok(GlobalLimitStatus {
            allowed: false,
            reason: Some(BreakerWindow::Daily),
            hourly_cost_cents,
            daily_cost_cents,
        });
    }

    Ok(GlobalLimitStatus {
        allowed: true,
        reason: None,
        hourly_cost_cents,
        daily_cost_cents,
    })
}
