// ABOUTME: Object storage contract for uploaded episode audio
// ABOUTME: Keys are namespaced per user; key validation blocks cross-user reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// S3-compatible presigned storage implementation
pub mod s3;

pub use s3::S3Storage;

/// A presigned upload slot handed to the browser
#[derive(Debug, Clone, Serialize)]
pub struct PresignedUpload {
    /// URL the client PUTs the file to
    pub url: String,
    /// Storage key the file will land under
    pub key: String,
}

/// Object storage backend for episode audio files
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Presign an upload into the user's namespace.
    async fn presign_upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        content_type: &str,
    ) -> AppResult<PresignedUpload>;

    /// Presign a download of an existing object.
    async fn presign_download(&self, key: &str) -> AppResult<String>;

    /// Object size in bytes, or `None` if the object does not exist.
    async fn head_size(&self, key: &str) -> AppResult<Option<u64>>;

    /// Delete an object. Missing objects are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Key prefix owned by one user
#[must_use]
pub fn user_key_prefix(user_id: Uuid) -> String {
    format!("users/{user_id}/")
}

/// Reject keys outside the user's namespace or containing path traversal.
///
/// # Errors
///
/// Returns `PermissionDenied` for foreign keys and `InvalidInput` for
/// malformed ones.
pub fn validate_user_key(key: &str, user_id: Uuid) -> AppResult<()> {
    if key.contains("..") || key.contains('\\') {
        return Err(AppError::invalid_input("Invalid storage key"));
    }
    let prefix = user_key_prefix(user_id);
    let remainder = key
        .strip_prefix(&prefix)
        .ok_or_else(|| AppError::permission_denied("Storage key belongs to another user"))?;
    if remainder.is_empty() {
        return Err(AppError::invalid_input("Invalid storage key"));
    }
    Ok(())
}
