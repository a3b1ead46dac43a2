// ABOUTME: Adaptive style learner run best-effort after each completed episode
// ABOUTME: Merges derived style into the profile without touching user-pinned fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ai::style_analysis::{analyze_style, StyleSample};
use crate::ai::ChatProvider;
use crate::database::Database;
use crate::errors::AppResult;
use crate::models::{
    PieceStatus, PlatformPreferences, StyleProfile, UsageOperation, Vocabulary,
};
use crate::usage::{check_budget, record_chat_usage};

/// Completed episodes required before any profile is derived
const MIN_COMPLETE_EPISODES: i64 = 3;

/// Content pieces required before any profile is derived
const MIN_PIECES: usize = 5;

/// Most recently updated pieces considered for sampling
const RECENT_PIECES_WINDOW: i64 = 100;

/// Pieces actually sent to the analyzer, to bound prompt size
const SAMPLE_CAP: usize = 50;

/// Derives and maintains per-user style profiles
pub struct StyleLearner {
    db: Database,
    chat: Arc<dyn ChatProvider>,
}

impl StyleLearner {
    #[must_use]
    pub fn new(db: Database, chat: Arc<dyn ChatProvider>) -> Self {
        Self { db, chat }
    }

    /// Update the user's style profile from their recent content.
    ///
    /// Best-effort by contract: every failure is logged and swallowed so
    /// a learner problem can never affect episode processing.
    pub async fn update_profile(&self, user_id: Uuid, episode_id: Option<Uuid>) {
        if let Err(e) = self.try_update_profile(user_id, episode_id).await {
            warn!(%user_id, error = %e, "style profile update failed");
        }
    }

    async fn try_update_profile(&self, user_id: Uuid, episode_id: Option<Uuid>) -> AppResult<()> {
        let completed_episodes = self.db.count_complete_episodes(user_id).await?;
        if completed_episodes < MIN_COMPLETE_EPISODES {
            debug!(%user_id, completed_episodes, "not enough episodes for style learning");
            return Ok(());
        }

        let pieces = self
            .db
            .recent_content_pieces(user_id, RECENT_PIECES_WINDOW)
            .await?;
        if pieces.len() < MIN_PIECES {
            debug!(%user_id, pieces = pieces.len(), "not enough content for style learning");
            return Ok(());
        }

        // Edited pieces carry the strongest voice signal; fall back to the
        // full recent set when the user has not edited enough yet
        let edited: Vec<_> = pieces
            .iter()
            .filter(|p| p.status == PieceStatus::Edited)
            .collect();
        let sample_pieces: Vec<_> = if edited.len() >= MIN_PIECES {
            edited.into_iter().take(SAMPLE_CAP).collect()
        } else {
            pieces.iter().take(SAMPLE_CAP).collect()
        };

        let samples: Vec<StyleSample> = sample_pieces
            .iter()
            .map(|p| StyleSample {
                platform: p.platform,
                content: p.content.clone(),
            })
            .collect();

        // The analysis call is billed, so it honors the monthly budget
        if !check_budget(&self.db, user_id).await?.allowed {
            debug!(%user_id, "budget exhausted, skipping style learning");
            return Ok(());
        }

        let (analysis, usage) = analyze_style(self.chat.as_ref(), &samples).await?;
        record_chat_usage(
            &self.db,
            user_id,
            episode_id,
            UsageOperation::StyleAnalysis,
            self.chat.model(),
            usage,
        )
        .await?;

        let existing = self.db.get_style_profile(user_id).await?;
        let overrides = existing
            .as_ref()
            .map(|p| p.manual_overrides)
            .unwrap_or_default();

        let derived_vocabulary = Vocabulary {
            preferences: analysis.vocabulary_preferences,
            avoidances: analysis.vocabulary_avoidances,
            emoji_usage: analysis.emoji_usage,
            hashtag_usage: analysis.hashtag_usage,
        };
        let derived_platform_preferences = PlatformPreferences {
            formality_score: analysis.formality_score,
            average_sentence_length: analysis.average_sentence_length,
            signature_patterns: analysis.signature_patterns,
            platform_differences: analysis.platform_differences,
        };

        // Pinned fields keep their stored value; the rest take the derived
        // one. sample_count always reflects the latest episode count.
        let profile = match existing {
            Some(current) => StyleProfile {
                user_id,
                tone: if overrides.tone { current.tone } else { analysis.tone },
                vocabulary: if overrides.vocabulary {
                    current.vocabulary
                } else {
                    derived_vocabulary
                },
                hook_patterns: if overrides.hook_patterns {
                    current.hook_patterns
                } else {
                    analysis.common_hooks
                },
                platform_preferences: if overrides.platform_preferences {
                    current.platform_preferences
                } else {
                    derived_platform_preferences
                },
                manual_overrides: current.manual_overrides,
                sample_count: completed_episodes,
                updated_at: Utc::now(),
            },
            None => StyleProfile {
                user_id,
                tone: analysis.tone,
                vocabulary: derived_vocabulary,
                hook_patterns: analysis.common_hooks,
                platform_preferences: derived_platform_preferences,
                manual_overrides: overrides,
                sample_count: completed_episodes,
                updated_at: Utc::now(),
            },
        };

        self.db.upsert_style_profile(&profile).await?;
        debug!(%user_id, sample_count = completed_episodes, "style profile updated");
        Ok(())
    }
}
