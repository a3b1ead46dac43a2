// ABOUTME: Usage ledger entries and per-user monthly budget counters
// ABOUTME: Ledger rows are immutable; costs are stored in minor currency units
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Kind of billable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageOperation {
    Transcription,
    Analysis,
    Generation,
    StyleAnalysis,
}

impl Display for UsageOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Transcription => "TRANSCRIPTION",
            Self::Analysis => "ANALYSIS",
            Self::Generation => "GENERATION",
            Self::StyleAnalysis => "STYLE_ANALYSIS",
        };
        write!(f, "{s}")
    }
}

impl FromStr for UsageOperation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSCRIPTION" => Ok(Self::Transcription),
            "ANALYSIS" => Ok(Self::Analysis),
            "GENERATION" => Ok(Self::Generation),
            "STYLE_ANALYSIS" => Ok(Self::StyleAnalysis),
            other => Err(AppError::internal(format!(
                "unknown usage operation: {other}"
            ))),
        }
    }
}

/// Append-only ledger entry for one billable operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Billed user
    pub user_id: Uuid,
    /// Episode the operation was part of, if any
    pub episode_id: Option<Uuid>,
    /// Operation kind
    pub operation: UsageOperation,
    /// Input token count (zero for non-token operations)
    pub input_tokens: i64,
    /// Output token count (zero for non-token operations)
    pub output_tokens: i64,
    /// Cost in minor currency units, rounded up; always non-negative
    pub cost_cents: i64,
    /// Model identifier the cost was quoted for
    pub model: String,
    /// When the operation happened
    pub created_at: DateTime<Utc>,
}

/// Per-user running monthly spend counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageBudget {
    /// Owning user (one budget row per user)
    pub user_id: Uuid,
    /// Monthly ceiling in minor currency units, from the subscription tier
    pub monthly_limit_cents: i64,
    /// Spend so far this calendar month
    pub current_month_usage_cents: i64,
    /// When the counter was last zeroed
    pub last_reset_at: DateTime<Utc>,
}
