// ABOUTME: Platform content generation task conditioned on analysis and style profile
// ABOUTME: Individually malformed pieces are dropped; an empty valid set is an error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::analyze::AnalysisResult;
use super::llm::{ChatProvider, ChatRequest, TokenUsage};
use crate::errors::{AppError, AppResult};
use crate::models::{ContentType, Platform, StyleProfile};

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 4096;

/// Transcript prefix included for voice matching
const VOICE_SAMPLE_CHARS: usize = 3000;

const GENERATION_SYSTEM_PROMPT: &str = r#"You are a social media content writer for podcasters. Generate platform-specific content from podcast analysis segments.

Rules by platform:

TWITTER:
- Generate a thread of 5-8 tweets. Each tweet must be under 280 characters.
- Tweet 1 is the hook. It must grab attention. Use a bold claim, surprising stat, or provocative question.
- Each subsequent tweet should build on the story or argument.
- Final tweet: call to action to listen to the full episode.
- No hashtags unless specifically requested.
- Also generate 3 standalone tweets (separate from the thread), each a self-contained insight.

LINKEDIN:
- Generate 2 posts. Each 150-300 words.
- Open with a hook: a question, bold statement, or brief story.
- Use line breaks for readability (short paragraphs, 1-2 sentences each).
- Professional but personal tone. Not corporate speak.
- End with a question to drive engagement or a CTA to listen.

INSTAGRAM:
- Generate 3 caption drafts for audiogram/reel posts.
- Each 50-150 words. Conversational, punchy.
- Include a call to action ("Link in bio", "Full episode out now").
- Suggest 3-5 relevant hashtags at the end of each caption.

NEWSLETTER:
- Generate 1 newsletter draft. 300-500 words.
- Conversational summary of the episode.
- Include 2-3 direct quotes from the speaker.
- End with key takeaways as bullet points.
- End with a CTA to listen to the full episode.

BLOG:
- Generate 1 SEO-optimized blog post draft. 800-1200 words.
- Include a compelling title, introduction, 3-5 sections with H2 headings, and a conclusion.
- Weave in quotes and insights from the episode.
- End with a call to action.

TIKTOK:
- Suggest 3-5 timestamp ranges from the content that would make good short clips.
- For each, provide: a suggested hook/caption and why it would work as a short-form clip.
- Format: "Clip idea: [topic], [why it works]"

CRITICAL: Match the speaker's voice. They said these things, so the posts should sound like them, not like a marketing agency. Use their vocabulary, their level of formality, their energy.

Return as JSON with this exact structure:
{
  "pieces": [
    { "platform": "TWITTER", "type": "THREAD", "content": "Tweet 1 text", "order": 1 },
    { "platform": "TWITTER", "type": "THREAD", "content": "Tweet 2 text", "order": 2 },
    { "platform": "TWITTER", "type": "POST", "content": "Standalone tweet", "order": 1 },
    { "platform": "LINKEDIN", "type": "POST", "content": "Full post text", "order": 1 },
    { "platform": "INSTAGRAM", "type": "CAPTION", "content": "Caption text", "order": 1 },
    { "platform": "NEWSLETTER", "type": "DRAFT", "content": "Newsletter text", "order": 0 },
    { "platform": "BLOG", "type": "DRAFT", "content": "Blog post text", "order": 0 },
    { "platform": "TIKTOK", "type": "TIMESTAMPS", "content": "Clip suggestions", "order": 1 }
  ]
}"#;

/// One generated piece as returned by the model, before persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPiece {
    pub platform: Platform,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub content: String,
    #[serde(default)]
    pub order: i64,
}

fn segments_text(analysis: &AnalysisResult) -> String {
    analysis
        .segments
        .iter()
        .map(|s| {
            let kind = serde_json::to_string(&s.kind)
                .unwrap_or_default()
                .trim_matches('"')
                .to_owned();
            s.context.as_ref().map_or_else(
                || format!("[{kind}] {}", s.content),
                |context| format!("[{kind}] {} (Context: {context})", s.content),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_user_prompt(
    analysis: &AnalysisResult,
    episode_title: &str,
    transcript: &str,
    style_profile: Option<&StyleProfile>,
) -> String {
    let excerpt: String = transcript.chars().take(VOICE_SAMPLE_CHARS).collect();
    let mut prompt = format!(
        "Episode: \"{episode_title}\"\n\n\
         Summary: {}\n\n\
         Main Topics: {}\n\n\
         Key Segments:\n{}\n\n\
         Full transcript excerpt (first {VOICE_SAMPLE_CHARS} chars for voice matching):\n{excerpt}",
        analysis.summary,
        analysis.main_topics.join(", "),
        segments_text(analysis),
    );

    if let Some(profile) = style_profile {
        if let Ok(style_json) = serde_json::to_string(profile) {
            prompt.push_str("\n\nApply these style preferences: ");
            prompt.push_str(&style_json);
        }
    }

    prompt
}

/// Generate platform content from an analysis.
///
/// Pieces that fail to parse individually are dropped with a warning;
/// only an empty valid set fails the stage.
///
/// # Errors
///
/// Returns an error if the chat call fails, the response has no `pieces`
/// array, or no piece in it is valid.
pub async fn generate_content(
    chat: &dyn ChatProvider,
    analysis: &AnalysisResult,
    episode_title: &str,
    transcript: &str,
    style_profile: Option<&StyleProfile>,
) -> AppResult<(Vec<GeneratedPiece>, TokenUsage)> {
    let user = build_user_prompt(analysis, episode_title, transcript, style_profile);
    let mut request = ChatRequest::json(GENERATION_SYSTEM_PROMPT, user, GENERATION_TEMPERATURE);
    request.max_tokens = Some(GENERATION_MAX_TOKENS);

    let completion = chat.complete(&request).await?;

    let envelope: serde_json::Value = serde_json::from_str(&completion.content).map_err(|e| {
        AppError::external_service("OpenAI", format!("invalid generation format: {e}"))
    })?;
    let raw_pieces = envelope
        .get("pieces")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| {
            AppError::external_service("OpenAI", "generation response missing pieces array")
        })?;

    let mut pieces = Vec::with_capacity(raw_pieces.len());
    for (index, raw) in raw_pieces.iter().enumerate() {
        match serde_json::from_value::<GeneratedPiece>(raw.clone()) {
            Ok(piece) if !piece.content.trim().is_empty() => pieces.push(piece),
            Ok(_) => warn!(index, "dropping generated piece with empty content"),
            Err(e) => warn!(index, error = %e, "dropping malformed generated piece"),
        }
    }

    if pieces.is_empty() {
        return Err(AppError::external_service(
            "OpenAI",
            "generation produced no valid pieces",
        ));
    }

    Ok((pieces, completion.usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::analyze::{AnalysisSegment, SegmentKind};

    fn sample_analysis() -> AnalysisResult {
        AnalysisResult {
            segments: vec![AnalysisSegment {
                kind: SegmentKind::KeyQuote,
                content: "ship early".into(),
                timestamp: None,
                context: Some("on product velocity".into()),
            }],
            summary: "An episode about shipping.".into(),
            main_topics: vec!["shipping".into()],
        }
    }

    #[test]
    fn test_user_prompt_includes_style_when_present() {
        let analysis = sample_analysis();
        let without = build_user_prompt(&analysis, "Ep 1", "transcript", None);
        assert!(!without.contains("style preferences"));
        assert!(without.contains("[KEY_QUOTE] ship early (Context: on product velocity)"));
    }

    #[test]
    fn test_malformed_piece_is_droppable() {
        let raw = serde_json::json!({ "platform": "MYSPACE", "type": "POST", "content": "x" });
        assert!(serde_json::from_value::<GeneratedPiece>(raw).is_err());

        let ok = serde_json::json!({ "platform": "TWITTER", "type": "THREAD", "content": "x" });
        let piece = serde_json::from_value::<GeneratedPiece>(ok).unwrap();
        assert_eq!(piece.order, 0);
    }
}
