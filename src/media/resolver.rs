// ABOUTME: Fetches episode audio from storage keys or vetted external URLs
// ABOUTME: Downloads are counted byte by byte and aborted at the configured cap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use super::url_guard::{resolve_and_pin, validate_external_url};
use crate::errors::{AppError, AppResult};
use crate::models::EpisodeSource;
use crate::storage::{validate_user_key, ObjectStorage};

/// Connection timeout for media downloads
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Total download timeout; large episodes take a while
const DOWNLOAD_TIMEOUT_SECS: u64 = 1_800;

/// Fetched episode audio ready for transcription
#[derive(Debug, Clone)]
pub struct ResolvedMedia {
    /// File name passed to the transcription API for MIME detection
    pub file_name: String,
    /// Raw audio bytes
    pub bytes: Bytes,
}

/// Source of episode audio; the pipeline's mockable seam
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fetch the audio behind an episode source on behalf of `user_id`.
    async fn fetch(&self, user_id: Uuid, source: &EpisodeSource) -> AppResult<ResolvedMedia>;
}

/// Production media source: object storage for uploads, vetted HTTP for URLs
pub struct HttpMediaResolver {
    storage: Arc<dyn ObjectStorage>,
    max_download_bytes: u64,
}

impl HttpMediaResolver {
    /// Create a resolver with the given download cap.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, max_download_bytes: u64) -> Self {
        Self {
            storage,
            max_download_bytes,
        }
    }

    fn build_client(addrs: Option<(&str, &[std::net::SocketAddr])>) -> AppResult<Client> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS));
        if let Some((host, resolved)) = addrs {
            // Pin the connection to the addresses vetted at resolve time
            builder = builder.resolve_to_addrs(host, resolved);
        }
        builder
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))
    }

    fn oversize_error(&self) -> AppError {
        AppError::invalid_input(format!(
            "Media file exceeds the maximum size of {} bytes",
            self.max_download_bytes
        ))
    }

    /// Stream a response body, aborting the moment the cumulative byte
    /// count passes the cap. Catches absent and false Content-Length.
    async fn read_capped(&self, response: reqwest::Response) -> AppResult<Bytes> {
        // Fast path: an honest Content-Length over the cap never transfers
        if let Some(declared) = response.content_length() {
            if declared > self.max_download_bytes {
                return Err(self.oversize_error());
            }
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::external_service("media", format!("download interrupted: {e}"))
            })?;
            if (buffer.len() + chunk.len()) as u64 > self.max_download_bytes {
                return Err(self.oversize_error());
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    async fn fetch_upload(&self, user_id: Uuid, file_key: &str) -> AppResult<ResolvedMedia> {
        validate_user_key(file_key, user_id)?;

        if let Some(size) = self.storage.head_size(file_key).await? {
            if size > self.max_download_bytes {
                return Err(self.oversize_error());
            }
        }

        let url = self.storage.presign_download(file_key).await?;
        let client = Self::build_client(None)?;
        let response = client.get(&url).send().await.map_err(|e| {
            AppError::external_service("storage", format!("download failed: {e}"))
        })?;
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "storage",
                format!("download returned {}", response.status()),
            ));
        }

        let bytes = self.read_capped(response).await?;
        debug!(file_key, bytes = bytes.len(), "fetched uploaded media");
        Ok(ResolvedMedia {
            file_name: file_name_from_path(file_key),
            bytes,
        })
    }

    async fn fetch_external(&self, raw_url: &str) -> AppResult<ResolvedMedia> {
        let url = validate_external_url(raw_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| AppError::invalid_input("URL must have a valid hostname"))?
            .to_owned();
        let addrs = resolve_and_pin(&url).await?;

        let client = Self::build_client(Some((&host, &addrs)))?;
        let response = client.get(url.clone()).send().await.map_err(|e| {
            AppError::external_service("media", format!("download failed: {e}"))
        })?;
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "media",
                format!("download returned {}", response.status()),
            ));
        }

        let bytes = self.read_capped(response).await?;
        debug!(url = %url, bytes = bytes.len(), "fetched external media");
        Ok(ResolvedMedia {
            file_name: file_name_from_path(url.path()),
            bytes,
        })
    }
}

/// Last path component, falling back to a generic audio name
fn file_name_from_path(path: &str) -> String {
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map_or_else(|| "audio.mp3".to_owned(), ToOwned::to_owned)
}

#[async_trait]
impl MediaSource for HttpMediaResolver {
    async fn fetch(&self, user_id: Uuid, source: &EpisodeSource) -> AppResult<ResolvedMedia> {
        match source {
            EpisodeSource::Upload { file_key } => self.fetch_upload(user_id, file_key).await,
            EpisodeSource::ExternalUrl { url } => self.fetch_external(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_extraction() {
        assert_eq!(file_name_from_path("users/u1/abc-ep.mp3"), "abc-ep.mp3");
        assert_eq!(file_name_from_path("/feed/episode.m4a"), "episode.m4a");
        assert_eq!(file_name_from_path("/feed/"), "audio.mp3");
        assert_eq!(file_name_from_path(""), "audio.mp3");
    }
}
