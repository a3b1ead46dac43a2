// ABOUTME: Audio transcription provider trait and Whisper API implementation
// ABOUTME: Returns transcript text plus audio duration, the basis for per-minute billing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Connection timeout for the transcription API
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Request timeout; long episodes upload and transcribe slowly
const REQUEST_TIMEOUT_SECS: u64 = 900;

/// A completed transcription
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Full transcript text
    pub text: String,
    /// Audio duration in whole seconds, rounded up
    pub duration_seconds: i64,
}

/// Audio transcription backend
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Transcribe an audio file.
    async fn transcribe(&self, file_name: &str, audio: Bytes) -> AppResult<Transcript>;

    /// Model identifier used for cost quoting and ledger rows.
    fn model(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    /// Audio duration in seconds, fractional
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct WhisperErrorResponse {
    error: WhisperErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WhisperErrorDetail {
    message: String,
}

/// `OpenAI` Whisper transcription provider
pub struct WhisperProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl WhisperProvider {
    /// Create a provider against `base_url` (e.g. <https://api.openai.com/v1>).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: String, base_url: String, model: String) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Guess the MIME type from a file name; the API rejects unlabeled uploads
fn guess_mime(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "audio/mpeg",
    }
}

#[async_trait]
impl TranscriptionProvider for WhisperProvider {
    async fn transcribe(&self, file_name: &str, audio: Bytes) -> AppResult<Transcript> {
        debug!(
            model = %self.model,
            file_name,
            bytes = audio.len(),
            "sending transcription request"
        );

        let file_part = Part::stream(audio)
            .file_name(file_name.to_owned())
            .mime_str(guess_mime(file_name))
            .map_err(|e| AppError::internal(format!("invalid MIME type: {e}")))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("Whisper", format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<WhisperErrorResponse>(&body).map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |r| r.error.message,
            );
            return Err(AppError::external_service(
                "Whisper",
                format!("API error ({status}): {detail}"),
            ));
        }

        let parsed: WhisperResponse = response.json().await.map_err(|e| {
            AppError::external_service("Whisper", format!("invalid response body: {e}"))
        })?;

        if parsed.text.trim().is_empty() {
            return Err(AppError::external_service(
                "Whisper",
                "transcription returned no text",
            ));
        }

        #[allow(clippy::cast_possible_truncation)]
        let duration_seconds = parsed.duration.ceil().max(0.0) as i64;

        Ok(Transcript {
            text: parsed.text,
            duration_seconds,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_guessing() {
        assert_eq!(guess_mime("episode.mp3"), "audio/mpeg");
        assert_eq!(guess_mime("episode.WAV"), "audio/wav");
        assert_eq!(guess_mime("episode.m4a"), "audio/mp4");
        assert_eq!(guess_mime("no-extension"), "audio/mpeg");
    }

    #[test]
    fn test_verbose_json_parsing() {
        let body = r#"{"text":"hello world","duration":12.34,"language":"en"}"#;
        let parsed: WhisperResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text, "hello world");
        assert!((parsed.duration - 12.34).abs() < f64::EPSILON);
    }
}
