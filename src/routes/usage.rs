// ABOUTME: Usage status endpoint: monthly budget plus global breaker view
// ABOUTME: Read-only; the same checks the pipeline gates on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use super::{AppState, AuthedUser};
use crate::errors::AppResult;
use crate::usage::{check_budget, check_global_limits, BudgetStatus, GlobalLimitStatus};

#[derive(Debug, Serialize)]
pub struct UsageStatusResponse {
    pub budget: BudgetStatus,
    pub platform: GlobalLimitStatus,
}

/// `GET /api/usage`
pub async fn status(
    State(state): State<AppState>,
    user: AuthedUser,
) -> AppResult<Json<UsageStatusResponse>> {
    let budget = check_budget(&state.db, user.user_id).await?;
    let platform = check_global_limits(&state.db, state.global_limits, Utc::now()).await?;
    Ok(Json(UsageStatusResponse { budget, platform }))
}
