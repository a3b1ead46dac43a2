// ABOUTME: Environment-based server configuration loaded at startup
// ABOUTME: Fail-fast on missing required values, typed defaults for the rest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::env;
use std::time::Duration;

use crate::errors::{AppError, ErrorCode};

/// Default per-process episode worker concurrency
pub const DEFAULT_WORKER_CONCURRENCY: usize = 2;
/// Default maximum delivery attempts per episode job
pub const DEFAULT_JOB_MAX_ATTEMPTS: u32 = 3;
/// Default base delay for exponential job backoff
pub const DEFAULT_JOB_BACKOFF_BASE_MS: u64 = 5_000;
/// Default maximum media download size (500 MB)
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 500 * 1024 * 1024;
/// Default global hourly spend ceiling in cents ($5.00)
pub const DEFAULT_GLOBAL_HOURLY_LIMIT_CENTS: i64 = 500;
/// Default global daily spend ceiling in cents ($50.00)
pub const DEFAULT_GLOBAL_DAILY_LIMIT_CENTS: i64 = 5_000;

/// Object storage (S3-compatible) configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,
    /// Region, e.g. `us-east-1`
    pub region: String,
    /// Endpoint override for S3-compatible providers (None = AWS)
    pub endpoint: Option<String>,
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Presigned URL validity
    pub presign_expiry: Duration,
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// JWT signing secret
    pub jwt_secret: String,
    /// OpenAI-compatible API key
    pub openai_api_key: String,
    /// OpenAI-compatible base URL
    pub openai_base_url: String,
    /// Chat model used for analysis, generation, and style derivation
    pub chat_model: String,
    /// Transcription model
    pub transcription_model: String,
    /// Global hourly spend ceiling in cents
    pub global_hourly_limit_cents: i64,
    /// Global daily spend ceiling in cents
    pub global_daily_limit_cents: i64,
    /// Maximum media download size in bytes
    pub max_download_bytes: u64,
    /// Episode worker pool size
    pub worker_concurrency: usize,
    /// Maximum delivery attempts per episode job
    pub job_max_attempts: u32,
    /// Base delay for exponential job backoff
    pub job_backoff_base: Duration,
    /// Object storage configuration
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` if a required variable is absent and
    /// `ConfigError` if a value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            http_port: parse_or("CASTCRAFT_HTTP_PORT", 8080)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:castcraft.db".to_owned()),
            jwt_secret: required("CASTCRAFT_JWT_SECRET")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
            chat_model: env::var("CASTCRAFT_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_owned()),
            transcription_model: env::var("CASTCRAFT_TRANSCRIPTION_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_owned()),
            global_hourly_limit_cents: parse_or(
                "GLOBAL_HOURLY_COST_LIMIT_CENTS",
                DEFAULT_GLOBAL_HOURLY_LIMIT_CENTS,
            )?,
            global_daily_limit_cents: parse_or(
                "GLOBAL_DAILY_COST_LIMIT_CENTS",
                DEFAULT_GLOBAL_DAILY_LIMIT_CENTS,
            )?,
            max_download_bytes: parse_or("CASTCRAFT_MAX_DOWNLOAD_BYTES", DEFAULT_MAX_DOWNLOAD_BYTES)?,
            worker_concurrency: parse_or("CASTCRAFT_WORKER_CONCURRENCY", DEFAULT_WORKER_CONCURRENCY)?,
            job_max_attempts: parse_or("CASTCRAFT_JOB_MAX_ATTEMPTS", DEFAULT_JOB_MAX_ATTEMPTS)?,
            job_backoff_base: Duration::from_millis(parse_or(
                "CASTCRAFT_JOB_BACKOFF_BASE_MS",
                DEFAULT_JOB_BACKOFF_BASE_MS,
            )?),
            storage: StorageConfig {
                bucket: required("CASTCRAFT_S3_BUCKET")?,
                region: env::var("CASTCRAFT_S3_REGION").unwrap_or_else(|_| "us-east-1".to_owned()),
                endpoint: env::var("CASTCRAFT_S3_ENDPOINT").ok(),
                access_key_id: required("CASTCRAFT_S3_ACCESS_KEY_ID")?,
                secret_access_key: required("CASTCRAFT_S3_SECRET_ACCESS_KEY")?,
                presign_expiry: Duration::from_secs(parse_or(
                    "CASTCRAFT_S3_PRESIGN_EXPIRY_SECS",
                    900,
                )?),
            },
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| {
        AppError::new(
            ErrorCode::ConfigMissing,
            format!("required environment variable {name} is not set"),
        )
    })
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("invalid value for {name}: {raw}"))),
        Err(_) => Ok(default),
    }
}
