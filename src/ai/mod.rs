// ABOUTME: AI adapter layer: chat and transcription provider traits plus task modules
// ABOUTME: Task modules own prompts, response schemas, and output validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

/// Transcript analysis task (summary, topics, quotes, hooks)
pub mod analyze;
/// Platform content generation task
pub mod generate;
/// Chat completion provider trait and the `OpenAI` implementation
pub mod llm;
/// Writing-style analysis task
pub mod style_analysis;
/// Audio transcription provider trait and the Whisper implementation
pub mod transcribe;

pub use analyze::{AnalysisResult, AnalysisSegment, SegmentKind};
pub use generate::GeneratedPiece;
pub use llm::{ChatCompletion, ChatProvider, ChatRequest, OpenAiProvider, TokenUsage};
pub use style_analysis::{StyleAnalysis, StyleSample};
pub use transcribe::{Transcript, TranscriptionProvider, WhisperProvider};
