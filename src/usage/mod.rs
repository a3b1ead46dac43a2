// ABOUTME: Cost controls: per-model pricing, per-user budget guard, usage tracker,
// ABOUTME: and the global spend circuit breaker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

/// Global spend circuit breaker over trailing windows
pub mod breaker;
/// Per-user monthly budget guard
pub mod guard;
/// Per-model pricing tables, integer cents math
pub mod pricing;
/// Usage metering: ledger append plus budget increment
pub mod tracker;

pub use breaker::{check_global_limits, BreakerWindow, GlobalLimitStatus, GlobalLimits};
pub use guard::{check_budget, BudgetStatus};
pub use tracker::{record_chat_usage, record_transcription_usage};
