// ABOUTME: Style profile endpoints: read and manual field overrides
// ABOUTME: Setting a field pins it against future automated learner updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use super::{AppState, AuthedUser};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ManualOverrides, PlatformPreferences, StyleProfile, Tone, Vocabulary,
};

#[derive(Debug, Deserialize)]
pub struct UpdateStyleProfileRequest {
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub vocabulary: Option<Vocabulary>,
    #[serde(default)]
    pub hook_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub platform_preferences: Option<PlatformPreferences>,
}

/// `GET /api/style-profile`
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthedUser,
) -> AppResult<Json<StyleProfile>> {
    let profile = state
        .db
        .get_style_profile(user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Style profile"))?;
    Ok(Json(profile))
}

/// `PUT /api/style-profile`
///
/// Each supplied field is written and its manual override flag set, so
/// the learner will never overwrite it afterwards.
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthedUser,
    Json(request): Json<UpdateStyleProfileRequest>,
) -> AppResult<Json<StyleProfile>> {
    if request.tone.is_none()
        && request.vocabulary.is_none()
        && request.hook_patterns.is_none()
        && request.platform_preferences.is_none()
    {
        return Err(AppError::invalid_input("No style fields supplied"));
    }

    let mut profile = state
        .db
        .get_style_profile(user.user_id)
        .await?
        .unwrap_or_else(|| StyleProfile {
            user_id: user.user_id,
            tone: Tone::Mixed,
            vocabulary: Vocabulary::default(),
            hook_patterns: Vec::new(),
            platform_preferences: PlatformPreferences::default(),
            manual_overrides: ManualOverrides::default(),
            sample_count: 0,
            updated_at: Utc::now(),
        });

    if let Some(tone) = request.tone {
        profile.tone = tone;
        profile.manual_overrides.tone = true;
    }
    if let Some(vocabulary) = request.vocabulary {
        profile.vocabulary = vocabulary;
        profile.manual_overrides.vocabulary = true;
    }
    if let Some(hook_patterns) = request.hook_patterns {
        profile.hook_patterns = hook_patterns;
        profile.manual_overrides.hook_patterns = true;
    }
    if let Some(platform_preferences) = request.platform_preferences {
        profile.platform_preferences = platform_preferences;
        profile.manual_overrides.platform_preferences = true;
    }
    profile.updated_at = Utc::now();

    state.db.upsert_style_profile(&profile).await?;
    Ok(Json(profile))
}
