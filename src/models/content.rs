// ABOUTME: Generated content piece model with platform and type enums
// ABOUTME: Ordering index is meaningful only for sequenced content such as threads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Target platform for a generated piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Twitter,
    Linkedin,
    Instagram,
    Newsletter,
    Blog,
    Tiktok,
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Twitter => "TWITTER",
            Self::Linkedin => "LINKEDIN",
            Self::Instagram => "INSTAGRAM",
            Self::Newsletter => "NEWSLETTER",
            Self::Blog => "BLOG",
            Self::Tiktok => "TIKTOK",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TWITTER" => Ok(Self::Twitter),
            "LINKEDIN" => Ok(Self::Linkedin),
            "INSTAGRAM" => Ok(Self::Instagram),
            "NEWSLETTER" => Ok(Self::Newsletter),
            "BLOG" => Ok(Self::Blog),
            "TIKTOK" => Ok(Self::Tiktok),
            other => Err(AppError::internal(format!("unknown platform: {other}"))),
        }
    }
}

/// Shape of a generated piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    /// One entry of a sequenced thread
    Thread,
    /// Standalone post
    Post,
    /// Caption for an audiogram or reel
    Caption,
    /// Long-form draft (newsletter, blog)
    Draft,
    /// Clip timestamp suggestions
    Timestamps,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Thread => "THREAD",
            Self::Post => "POST",
            Self::Caption => "CAPTION",
            Self::Draft => "DRAFT",
            Self::Timestamps => "TIMESTAMPS",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "THREAD" => Ok(Self::Thread),
            "POST" => Ok(Self::Post),
            "CAPTION" => Ok(Self::Caption),
            "DRAFT" => Ok(Self::Draft),
            "TIMESTAMPS" => Ok(Self::Timestamps),
            other => Err(AppError::internal(format!("unknown content type: {other}"))),
        }
    }
}

/// Lifecycle status of a piece; non-linear after `Generated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceStatus {
    Generated,
    Edited,
    Copied,
    Published,
}

impl Display for PieceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Generated => "GENERATED",
            Self::Edited => "EDITED",
            Self::Copied => "COPIED",
            Self::Published => "PUBLISHED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PieceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERATED" => Ok(Self::Generated),
            "EDITED" => Ok(Self::Edited),
            "COPIED" => Ok(Self::Copied),
            "PUBLISHED" => Ok(Self::Published),
            other => Err(AppError::internal(format!("unknown piece status: {other}"))),
        }
    }
}

/// One generated, platform-targeted artifact derived from an episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPiece {
    /// Unique identifier
    pub id: Uuid,
    /// Source episode
    pub episode_id: Uuid,
    /// Owning user (denormalized for style sampling queries)
    pub user_id: Uuid,
    /// Target platform
    pub platform: Platform,
    /// Piece shape
    pub content_type: ContentType,
    /// The generated text
    pub content: String,
    /// Position within (episode, platform, type); meaningful for threads
    pub order_index: i64,
    /// Lifecycle status
    pub status: PieceStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last user edit or status toggle
    pub updated_at: DateTime<Utc>,
}
