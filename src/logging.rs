// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures tracing subscriber with env-driven level and output format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Compact format for development
    Compact,
}

impl LogFormat {
    fn from_env() -> Self {
        match env::var("CASTCRAFT_LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Log level comes from `RUST_LOG` (default `castcraft=info,info`), output
/// format from `CASTCRAFT_LOG_FORMAT` (`json` or `compact`).
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("castcraft=info,info"));

    match LogFormat::from_env() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}
