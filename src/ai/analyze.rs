// ABOUTME: Transcript analysis task: extracts shareable segments, summary, and topics
// ABOUTME: Analysis output feeds generation, so a malformed response is a hard error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use serde::{Deserialize, Serialize};

use super::llm::{ChatProvider, ChatRequest, TokenUsage};
use crate::errors::{AppError, AppResult};

const ANALYSIS_TEMPERATURE: f32 = 0.3;

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a content analyst for podcast episodes. Your job is to identify the most engaging, shareable, and valuable segments from a transcript.

Extract:
1. KEY_QUOTE: Direct quotes that are punchy, insightful, or controversial
2. STORY: Personal anecdotes or case studies that would resonate on social media
3. ARGUMENT: Strong opinions or frameworks the speaker presents
4. HOOK: Potential opening lines for social posts based on the content
5. TAKEAWAY: Core lessons or actionable advice

Also provide:
- A 2-3 sentence summary of the episode
- The 3-5 main topics discussed

Return as JSON with this exact structure:
{
  "segments": [
    { "type": "KEY_QUOTE", "content": "...", "context": "brief context for this quote" },
    { "type": "STORY", "content": "...", "context": "what the story is about" },
    { "type": "ARGUMENT", "content": "...", "context": "the core claim" },
    { "type": "HOOK", "content": "...", "context": "what topic this hooks into" },
    { "type": "TAKEAWAY", "content": "...", "context": "why this matters" }
  ],
  "summary": "...",
  "mainTopics": ["topic1", "topic2", "topic3"]
}

Be selective - quality over quantity. A 60-minute episode should yield 8-12 key segments, not 50. A 10-minute episode should yield 4-6."#;

/// Kind of extracted transcript segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SegmentKind {
    KeyQuote,
    Story,
    Argument,
    Hook,
    Takeaway,
}

/// One extracted segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSegment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Structured analysis of one transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub segments: Vec<AnalysisSegment>,
    pub summary: String,
    #[serde(default)]
    pub main_topics: Vec<String>,
}

/// Analyze a transcript into segments, summary, and topics.
///
/// The whole downstream pipeline depends on this shape, so any malformed
/// or empty response fails the stage rather than degrading silently.
///
/// # Errors
///
/// Returns an error if the chat call fails or the response does not
/// parse into a non-empty `AnalysisResult`.
pub async fn analyze_transcript(
    chat: &dyn ChatProvider,
    episode_title: &str,
    transcript: &str,
) -> AppResult<(AnalysisResult, TokenUsage)> {
    let user = format!("Episode title: \"{episode_title}\"\n\nTranscript:\n{transcript}");
    let request = ChatRequest::json(ANALYSIS_SYSTEM_PROMPT, user, ANALYSIS_TEMPERATURE);

    let completion = chat.complete(&request).await?;

    let result: AnalysisResult = serde_json::from_str(&completion.content).map_err(|e| {
        AppError::external_service("OpenAI", format!("invalid analysis format: {e}"))
    })?;

    if result.segments.is_empty() {
        return Err(AppError::external_service(
            "OpenAI",
            "analysis returned no segments",
        ));
    }
    if result.summary.trim().is_empty() {
        return Err(AppError::external_service(
            "OpenAI",
            "analysis returned no summary",
        ));
    }

    Ok((result, completion.usage))
}
