// ABOUTME: Core domain models for episodes, content pieces, style profiles, and usage
// ABOUTME: String-backed enums shared between the database layer and the API surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

/// Generated content piece types
pub mod content;
/// Episode lifecycle types
pub mod episode;
/// Derived writing-style profile types
pub mod style;
/// Usage ledger and budget types
pub mod usage;
/// User account and subscription tier types
pub mod user;

pub use content::{ContentPiece, ContentType, PieceStatus, Platform};
pub use episode::{Episode, EpisodeSource, EpisodeStatus};
pub use style::{
    EmojiUsage, HashtagUsage, ManualOverrides, PlatformPreferences, StyleProfile, Tone, Vocabulary,
};
pub use usage::{UsageBudget, UsageOperation, UsageRecord};
pub use user::{SubscriptionTier, User};
