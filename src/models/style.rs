// ABOUTME: Typed writing-style profile replacing the loosely-typed JSON of early versions
// ABOUTME: Manual override flags protect user-set fields from the automated learner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall tone of the user's writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Casual,
    Professional,
    Mixed,
}

/// Emoji usage level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiUsage {
    None,
    #[default]
    Minimal,
    Moderate,
    Heavy,
}

/// Hashtag usage level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashtagUsage {
    None,
    #[default]
    Minimal,
    PlatformSpecific,
}

/// Vocabulary preferences derived from (or set by) the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Words and phrases the user reaches for
    #[serde(default)]
    pub preferences: Vec<String>,
    /// Words and phrases the user avoids or edits out
    #[serde(default)]
    pub avoidances: Vec<String>,
    /// Emoji usage level
    #[serde(default)]
    pub emoji_usage: EmojiUsage,
    /// Hashtag usage level
    #[serde(default)]
    pub hashtag_usage: HashtagUsage,
}

/// Per-platform stylistic preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformPreferences {
    /// Formality on a 1-10 scale
    #[serde(default)]
    pub formality_score: f64,
    /// Average sentence length in words
    #[serde(default)]
    pub average_sentence_length: f64,
    /// Recurring phrases, sign-offs, and structural patterns
    #[serde(default)]
    pub signature_patterns: Vec<String>,
    /// Tonal differences keyed by platform name
    #[serde(default)]
    pub platform_differences: HashMap<String, HashMap<String, String>>,
}

/// Boolean flags marking fields the user has set manually.
///
/// A flagged field is never overwritten by the automated learner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverrides {
    #[serde(default)]
    pub tone: bool,
    #[serde(default)]
    pub vocabulary: bool,
    #[serde(default)]
    pub hook_patterns: bool,
    #[serde(default)]
    pub platform_preferences: bool,
}

/// Per-user derived model of writing voice used to condition generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Owning user (one profile per user)
    pub user_id: Uuid,
    /// Overall tone
    pub tone: Tone,
    /// Vocabulary preferences
    pub vocabulary: Vocabulary,
    /// Common post-opening patterns (question, bold claim, story opening, ...)
    pub hook_patterns: Vec<String>,
    /// Per-platform preferences
    pub platform_preferences: PlatformPreferences,
    /// Fields the user has pinned manually
    pub manual_overrides: ManualOverrides,
    /// Number of completed episodes the profile was derived from; only increases
    pub sample_count: i64,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}
