// ABOUTME: Shared test utilities: in-memory database, fixtures, and AI mocks
// ABOUTME: Mocks implement the provider traits the pipeline depends on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use castcraft::ai::{
    ChatCompletion, ChatProvider, ChatRequest, TokenUsage, Transcript, TranscriptionProvider,
};
use castcraft::database::Database;
use castcraft::errors::{AppError, AppResult};
use castcraft::media::{MediaSource, ResolvedMedia};
use castcraft::models::{
    ContentPiece, ContentType, Episode, EpisodeSource, PieceStatus, Platform, SubscriptionTier,
    User,
};
use castcraft::storage::{user_key_prefix, ObjectStorage, PresignedUpload};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// In-memory database with the full schema applied
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    let db = Database::new("sqlite::memory:").await?;
    db.migrate().await?;
    Ok(db)
}

/// Insert a verified free-tier user and return it
pub async fn create_verified_user(db: &Database) -> Result<User> {
    create_user_with(db, true, SubscriptionTier::Free).await
}

pub async fn create_user_with(
    db: &Database,
    verified: bool,
    tier: SubscriptionTier,
) -> Result<User> {
    let mut user = User::new(
        format!("user-{}@example.com", Uuid::new_v4()),
        "$2b$04$testhashtesthashtesthash".to_owned(),
    );
    user.tier = tier;
    db.create_user(&user, &Uuid::new_v4().to_string()).await?;
    if verified {
        db.mark_email_verified(user.id).await?;
        user.email_verified = true;
    }
    Ok(user)
}

/// Insert an upload-sourced episode in its initial state
pub async fn create_upload_episode(db: &Database, user_id: Uuid) -> Result<Episode> {
    let episode = Episode::new(
        user_id,
        "Test Episode".to_owned(),
        EpisodeSource::Upload {
            file_key: format!("{}episode.mp3", user_key_prefix(user_id)),
        },
    );
    db.create_episode(&episode).await?;
    Ok(episode)
}

/// Insert a content piece directly, bypassing generation
pub async fn insert_piece(
    db: &Database,
    user_id: Uuid,
    episode_id: Uuid,
    platform: Platform,
    status: PieceStatus,
    content: &str,
) -> Result<ContentPiece> {
    let now = Utc::now();
    let piece = ContentPiece {
        id: Uuid::new_v4(),
        episode_id,
        user_id,
        platform,
        content_type: ContentType::Post,
        content: content.to_owned(),
        order_index: 0,
        status: PieceStatus::Generated,
        created_at: now,
        updated_at: now,
    };
    db.insert_content_pieces(std::slice::from_ref(&piece)).await?;
    if status != PieceStatus::Generated {
        db.update_content_piece_status(piece.id, status).await?;
    }
    Ok(piece)
}

// ============================================================================
// AI and media mocks
// ============================================================================

/// Canned analysis response in the shape the analyzer validates
pub fn analysis_response_json() -> String {
    serde_json::json!({
        "segments": [
            { "type": "KEY_QUOTE", "content": "ship small, ship often", "context": "velocity" },
            { "type": "TAKEAWAY", "content": "weekly releases beat quarterly ones" }
        ],
        "summary": "An episode about release cadence.",
        "mainTopics": ["shipping", "process"]
    })
    .to_string()
}

/// Canned generation response with a handful of valid pieces
pub fn generation_response_json() -> String {
    serde_json::json!({
        "pieces": [
            { "platform": "TWITTER", "type": "THREAD", "content": "1/ ship small", "order": 1 },
            { "platform": "TWITTER", "type": "THREAD", "content": "2/ ship often", "order": 2 },
            { "platform": "LINKEDIN", "type": "POST", "content": "Release cadence matters.", "order": 1 }
        ]
    })
    .to_string()
}

/// Canned style analysis response passing strict validation
pub fn style_response_json() -> String {
    serde_json::json!({
        "tone": "casual",
        "formalityScore": 4,
        "averageSentenceLength": 11.0,
        "commonHooks": ["question"],
        "vocabularyPreferences": ["honestly"],
        "vocabularyAvoidances": ["synergy"],
        "emojiUsage": "minimal",
        "hashtagUsage": "none",
        "signaturePatterns": ["ends with a question"],
        "platformDifferences": {}
    })
    .to_string()
}

/// Chat mock returning queued responses in order, with fixed token usage
pub struct MockChat {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    pub usage: TokenUsage,
    pub calls: AtomicU32,
}

impl MockChat {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
            usage: TokenUsage {
                input_tokens: 1_000,
                output_tokens: 500,
            },
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_usage(responses: Vec<String>, usage: TokenUsage) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
            usage,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompt of the most recent completion, if any
    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatProvider for MockChat {
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.user.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(AppError::external_service("mock", "no responses queued"));
        }
        Ok(ChatCompletion {
            content: responses.remove(0),
            usage: self.usage,
            model: "gpt-4o".to_owned(),
        })
    }

    fn model(&self) -> &str {
        "gpt-4o"
    }
}

/// Transcriber mock returning fixed text and duration
pub struct MockTranscriber {
    pub text: String,
    pub duration_seconds: i64,
    pub fail: bool,
}

impl MockTranscriber {
    pub fn new(text: &str, duration_seconds: i64) -> Self {
        Self {
            text: text.to_owned(),
            duration_seconds,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            duration_seconds: 0,
            fail: true,
        }
    }
}

#[async_trait]
impl TranscriptionProvider for MockTranscriber {
    async fn transcribe(&self, _file_name: &str, _audio: Bytes) -> AppResult<Transcript> {
        if self.fail {
            return Err(AppError::external_service("mock", "transcription down"));
        }
        Ok(Transcript {
            text: self.text.clone(),
            duration_seconds: self.duration_seconds,
        })
    }

    fn model(&self) -> &str {
        "whisper-1"
    }
}

/// Media mock serving fixed bytes for any source
pub struct MockMedia {
    pub bytes: Bytes,
}

impl MockMedia {
    pub fn new() -> Self {
        Self {
            bytes: Bytes::from_static(b"fake audio bytes"),
        }
    }
}

impl Default for MockMedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for MockMedia {
    async fn fetch(&self, _user_id: Uuid, _source: &EpisodeSource) -> AppResult<ResolvedMedia> {
        Ok(ResolvedMedia {
            file_name: "episode.mp3".to_owned(),
            bytes: self.bytes.clone(),
        })
    }
}

/// In-memory object storage double
#[derive(Default)]
pub struct MemoryStorage {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn presign_upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        _content_type: &str,
    ) -> AppResult<PresignedUpload> {
        let key = format!("{}{file_name}", user_key_prefix(user_id));
        Ok(PresignedUpload {
            url: format!("memory://upload/{key}"),
            key,
        })
    }

    async fn presign_download(&self, key: &str) -> AppResult<String> {
        Ok(format!("memory://download/{key}"))
    }

    async fn head_size(&self, key: &str) -> AppResult<Option<u64>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|bytes| bytes.len() as u64))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_owned());
        Ok(())
    }
}
