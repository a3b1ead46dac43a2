// ABOUTME: Main library entry point for the CastCraft content platform
// ABOUTME: Turns podcast episodes into budgeted, style-adapted social content
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

#![deny(unsafe_code)]

//! # `CastCraft`
//!
//! Backend for a podcast-to-social-content service. An episode arrives as
//! an uploaded file or an external URL, runs through transcription,
//! analysis, and platform content generation, and comes out as editable
//! content pieces, all while per-user budgets and a global spend breaker
//! keep API costs bounded.
//!
//! ## Architecture
//!
//! - **pipeline**: the episode orchestrator (gates, stages, failure policy)
//! - **usage**: pricing, budget guard, tracker, and the circuit breaker
//! - **style**: the adaptive writing-style learner
//! - **ai**: chat and transcription provider contracts plus task prompts
//! - **media**: SSRF-guarded, size-capped media acquisition
//! - **jobs**: in-process queue and retrying worker pool
//! - **routes**: the axum HTTP surface
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use castcraft::config::ServerConfig;
//! use castcraft::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("CastCraft configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// AI provider contracts and task modules
pub mod ai;
/// JWT session tokens
pub mod auth;
/// Environment configuration
pub mod config;
/// SQLite persistence layer
pub mod database;
/// Unified error handling
pub mod errors;
/// Background job queue and workers
pub mod jobs;
/// Tracing setup
pub mod logging;
/// Media acquisition with SSRF and size defences
pub mod media;
/// Domain models
pub mod models;
/// Episode processing orchestrator
pub mod pipeline;
/// HTTP API surface
pub mod routes;
/// Error message sanitization
pub mod sanitize;
/// Object storage contract and S3 implementation
pub mod storage;
/// Adaptive style learner
pub mod style;
/// Cost controls: pricing, budgets, breaker
pub mod usage;
