// ABOUTME: Chat completion provider trait and OpenAI chat completions implementation
// ABOUTME: Reports token usage with every completion so callers can meter cost
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AppError, AppResult};

/// Connection timeout for the chat API
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Request timeout; generation calls can run long
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Token counts reported by the provider for one completion
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// A chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System prompt
    pub system: String,
    /// User message
    pub user: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Hard output cap, when the task has one
    pub max_tokens: Option<u32>,
    /// Ask the provider to return a single JSON object
    pub json_mode: bool,
}

impl ChatRequest {
    /// A JSON-mode request, the shape every pipeline task uses
    #[must_use]
    pub fn json(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            max_tokens: None,
            json_mode: true,
        }
    }
}

/// A completed chat response with metered usage
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Assistant message content
    pub content: String,
    /// Token usage for cost metering
    pub usage: TokenUsage,
    /// Model that actually served the request
    pub model: String,
}

/// Chat completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one chat completion.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion>;

    /// Model identifier used for cost quoting and ledger rows.
    fn model(&self) -> &str;
}

// ============================================================================
// OpenAI chat completions API types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: i64,
    completion_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Provider implementation
// ============================================================================

/// `OpenAI` chat completions provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
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

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body)
            .map_or_else(
                |_| body.chars().take(200).collect::<String>(),
                |r| r.error.message,
            );

        match status.as_u16() {
            401 => AppError::auth_invalid(format!("API authentication failed: {detail}")),
            400 => AppError::invalid_input(format!("API validation error: {detail}")),
            _ => AppError::external_service("OpenAI", format!("API error ({status}): {detail}")),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: &request.system,
                },
                OpenAiMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        debug!(
            model = %self.model,
            user_len = request.user.len(),
            json_mode = request.json_mode,
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::external_service("OpenAI", format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let parsed: OpenAiResponse = response.json().await.map_err(|e| {
            AppError::external_service("OpenAI", format!("invalid response body: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                AppError::external_service("OpenAI", "response contained no completion")
            })?;

        let usage = parsed.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(ChatCompletion {
            content,
            usage,
            model: parsed.model,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
