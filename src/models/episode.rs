// ABOUTME: Episode model and processing state machine definitions
// ABOUTME: Status transitions are forward-only except explicit reprocessing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Processing status of an episode.
///
/// Transitions are a prefix of
/// `UPLOADING|TRANSCRIBING -> ANALYZING -> GENERATING -> COMPLETE`,
/// terminating early at `FAILED`. `FAILED` is escapable only via an
/// explicit reprocess, which re-enters the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpisodeStatus {
    /// Created from an upload, waiting to be picked up
    Uploading,
    /// Media resolution and speech-to-text in progress
    Transcribing,
    /// Segment extraction in progress
    Analyzing,
    /// Platform content generation in progress
    Generating,
    /// Terminal success state
    Complete,
    /// Terminal failure state, awaiting explicit reprocess
    Failed,
}

impl Display for EpisodeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            Self::Uploading => "UPLOADING",
            Self::Transcribing => "TRANSCRIBING",
            Self::Analyzing => "ANALYZING",
            Self::Generating => "GENERATING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

impl FromStr for EpisodeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOADING" => Ok(Self::Uploading),
            "TRANSCRIBING" => Ok(Self::Transcribing),
            "ANALYZING" => Ok(Self::Analyzing),
            "GENERATING" => Ok(Self::Generating),
            "COMPLETE" => Ok(Self::Complete),
            "FAILED" => Ok(Self::Failed),
            other => Err(AppError::internal(format!(
                "unknown episode status: {other}"
            ))),
        }
    }
}

/// Where an episode's media comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpisodeSource {
    /// A file previously uploaded to object storage
    Upload {
        /// Storage key within the owner's namespace
        file_key: String,
    },
    /// A publicly reachable media URL
    ExternalUrl {
        /// The submitted URL
        url: String,
    },
}

impl EpisodeSource {
    /// Column value for the source kind
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "UPLOAD",
            Self::ExternalUrl { .. } => "EXTERNAL_URL",
        }
    }

    /// Column value for the source locator (key or URL)
    #[must_use]
    pub fn locator(&self) -> &str {
        match self {
            Self::Upload { file_key } => file_key,
            Self::ExternalUrl { url } => url,
        }
    }

    /// Reassemble from the persisted kind/locator pair
    pub fn from_parts(kind: &str, locator: &str) -> Result<Self, AppError> {
        match kind {
            "UPLOAD" => Ok(Self::Upload {
                file_key: locator.to_owned(),
            }),
            "EXTERNAL_URL" => Ok(Self::ExternalUrl {
                url: locator.to_owned(),
            }),
            other => Err(AppError::internal(format!("unknown source kind: {other}"))),
        }
    }

    /// Status an episode starts in, by source kind
    #[must_use]
    pub const fn initial_status(&self) -> EpisodeStatus {
        match self {
            Self::Upload { .. } => EpisodeStatus::Uploading,
            Self::ExternalUrl { .. } => EpisodeStatus::Transcribing,
        }
    }
}

/// One user-submitted media item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Unique identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Title shown in the dashboard and passed to the analyzer
    pub title: String,
    /// Media source descriptor
    pub source: EpisodeSource,
    /// Current processing status
    pub status: EpisodeStatus,
    /// Coarse progress percentage for UI polling (0-100)
    pub progress: i64,
    /// Transcription text, persisted as soon as transcription succeeds
    pub transcription: Option<String>,
    /// Audio duration in seconds
    pub duration_seconds: Option<i64>,
    /// Sanitized failure message, if any
    pub error_message: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Completion timestamp
    pub processed_at: Option<DateTime<Utc>>,
}

impl Episode {
    /// Create a new episode in its initial state
    #[must_use]
    pub fn new(user_id: Uuid, title: String, source: EpisodeSource) -> Self {
        let status = source.initial_status();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            source,
            status,
            progress: 0,
            transcription: None,
            duration_seconds: None,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }
}
