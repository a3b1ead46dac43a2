// ABOUTME: Writing-style derivation task over a creator's edited content samples
// ABOUTME: Validates tone enum, formality range, and bounded list lengths strictly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::llm::{ChatProvider, ChatRequest, TokenUsage};
use crate::errors::{AppError, AppResult};
use crate::models::{EmojiUsage, HashtagUsage, Platform, Tone};

const STYLE_TEMPERATURE: f32 = 0.3;

const MAX_HOOKS: usize = 20;
const MAX_HOOK_CHARS: usize = 200;
const MAX_VOCABULARY: usize = 50;
const MAX_VOCABULARY_CHARS: usize = 200;
const MAX_SIGNATURE_PATTERNS: usize = 20;
const MAX_SIGNATURE_CHARS: usize = 500;
const MAX_PLATFORM_NOTE_CHARS: usize = 500;

const STYLE_SYSTEM_PROMPT: &str = r#"Analyze the following collection of edited social media posts by this creator. Identify their writing patterns.

Return structured JSON with this exact structure:
{
  "tone": "casual" | "professional" | "mixed",
  "formalityScore": 1-10,
  "averageSentenceLength": number,
  "commonHooks": ["question", "bold_claim", "story_opening", etc.],
  "vocabularyPreferences": ["words or phrases they use often"],
  "vocabularyAvoidances": ["words or phrases they never use or edited out"],
  "emojiUsage": "none" | "minimal" | "moderate" | "heavy",
  "hashtagUsage": "none" | "minimal" | "platform_specific",
  "signaturePatterns": ["any recurring phrases, sign-offs, or structural patterns"],
  "platformDifferences": {
    "TWITTER": { "tone": "...", "style_notes": "..." },
    "LINKEDIN": { "tone": "...", "style_notes": "..." }
  }
}

Focus on patterns that distinguish this creator from generic AI output. Look for:
- How they open posts (questions? bold claims? stories?)
- Sentence rhythm (short and punchy? flowing and detailed?)
- Vocabulary choices (formal vs casual, jargon, colloquialisms)
- Structural preferences (line breaks, bullet points, paragraphs)
- Platform-specific differences in how they write

If there aren't enough samples to detect a clear pattern for a field, use reasonable defaults and note it in signaturePatterns."#;

/// One content sample offered to the style analyzer
#[derive(Debug, Clone)]
pub struct StyleSample {
    pub platform: Platform,
    pub content: String,
}

/// Structured style description returned by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAnalysis {
    pub tone: Tone,
    pub formality_score: f64,
    pub average_sentence_length: f64,
    #[serde(default)]
    pub common_hooks: Vec<String>,
    #[serde(default)]
    pub vocabulary_preferences: Vec<String>,
    #[serde(default)]
    pub vocabulary_avoidances: Vec<String>,
    pub emoji_usage: EmojiUsage,
    pub hashtag_usage: HashtagUsage,
    #[serde(default)]
    pub signature_patterns: Vec<String>,
    #[serde(default)]
    pub platform_differences: HashMap<String, HashMap<String, String>>,
}

impl StyleAnalysis {
    /// Reject out-of-range scores and unbounded lists before they reach storage.
    fn validate(&self) -> AppResult<()> {
        if !(1.0..=10.0).contains(&self.formality_score) {
            return Err(invalid(format!(
                "formalityScore out of range: {}",
                self.formality_score
            )));
        }
        if self.average_sentence_length < 0.0 {
            return Err(invalid("averageSentenceLength is negative"));
        }
        check_list(&self.common_hooks, MAX_HOOKS, MAX_HOOK_CHARS, "commonHooks")?;
        check_list(
            &self.vocabulary_preferences,
            MAX_VOCABULARY,
            MAX_VOCABULARY_CHARS,
            "vocabularyPreferences",
        )?;
        check_list(
            &self.vocabulary_avoidances,
            MAX_VOCABULARY,
            MAX_VOCABULARY_CHARS,
            "vocabularyAvoidances",
        )?;
        check_list(
            &self.signature_patterns,
            MAX_SIGNATURE_PATTERNS,
            MAX_SIGNATURE_CHARS,
            "signaturePatterns",
        )?;
        for notes in self.platform_differences.values() {
            for value in notes.values() {
                if value.chars().count() > MAX_PLATFORM_NOTE_CHARS {
                    return Err(invalid("platformDifferences note too long"));
                }
            }
        }
        Ok(())
    }
}

fn invalid(detail: impl Into<String>) -> AppError {
    AppError::external_service(
        "OpenAI",
        format!("invalid style analysis: {}", detail.into()),
    )
}

fn check_list(items: &[String], max_items: usize, max_chars: usize, field: &str) -> AppResult<()> {
    if items.len() > max_items {
        return Err(invalid(format!("{field} has too many entries")));
    }
    if items.iter().any(|item| item.chars().count() > max_chars) {
        return Err(invalid(format!("{field} entry too long")));
    }
    Ok(())
}

fn build_samples_text(samples: &[StyleSample]) -> String {
    let mut by_platform: Vec<(Platform, Vec<&str>)> = Vec::new();
    for sample in samples {
        match by_platform.iter_mut().find(|(p, _)| *p == sample.platform) {
            Some((_, contents)) => contents.push(&sample.content),
            None => by_platform.push((sample.platform, vec![&sample.content])),
        }
    }

    let mut text = String::new();
    for (platform, contents) in by_platform {
        text.push_str(&format!("\n\n=== {platform} ===\n"));
        let joined = contents
            .iter()
            .enumerate()
            .map(|(i, c)| format!("--- Sample {} ---\n{c}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        text.push_str(&joined);
    }
    text
}

/// Derive a structured style description from content samples.
///
/// # Errors
///
/// Returns an error if the chat call fails or the response fails strict
/// schema validation.
pub async fn analyze_style(
    chat: &dyn ChatProvider,
    samples: &[StyleSample],
) -> AppResult<(StyleAnalysis, TokenUsage)> {
    let user = format!(
        "Analyze these {} content pieces from this creator:\n{}",
        samples.len(),
        build_samples_text(samples)
    );
    let request = ChatRequest::json(STYLE_SYSTEM_PROMPT, user, STYLE_TEMPERATURE);

    let completion = chat.complete(&request).await?;

    let analysis: StyleAnalysis = serde_json::from_str(&completion.content)
        .map_err(|e| invalid(format!("parse error: {e}")))?;
    analysis.validate()?;

    Ok((analysis, completion.usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_analysis() -> StyleAnalysis {
        StyleAnalysis {
            tone: Tone::Casual,
            formality_score: 4.0,
            average_sentence_length: 12.5,
            common_hooks: vec!["question".into()],
            vocabulary_preferences: vec!["honestly".into()],
            vocabulary_avoidances: vec!["synergy".into()],
            emoji_usage: EmojiUsage::Minimal,
            hashtag_usage: HashtagUsage::None,
            signature_patterns: vec!["ends with a question".into()],
            platform_differences: HashMap::new(),
        }
    }

    #[test]
    fn test_valid_analysis_passes() {
        assert!(valid_analysis().validate().is_ok());
    }

    #[test]
    fn test_formality_out_of_range_is_rejected() {
        let mut analysis = valid_analysis();
        analysis.formality_score = 11.0;
        assert!(analysis.validate().is_err());

        analysis.formality_score = 0.5;
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_oversized_list_is_rejected() {
        let mut analysis = valid_analysis();
        analysis.vocabulary_preferences = (0..51).map(|i| format!("word{i}")).collect();
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_camel_case_round_trip() {
        let json = serde_json::to_string(&valid_analysis()).unwrap();
        assert!(json.contains("formalityScore"));
        assert!(json.contains("hashtagUsage"));
        let parsed: StyleAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tone, Tone::Casual);
    }

    #[test]
    fn test_samples_grouped_by_platform() {
        let samples = vec![
            StyleSample {
                platform: Platform::Twitter,
                content: "first".into(),
            },
            StyleSample {
                platform: Platform::Linkedin,
                content: "second".into(),
            },
            StyleSample {
                platform: Platform::Twitter,
                content: "third".into(),
            },
        ];
        let text = build_samples_text(&samples);
        assert!(text.contains("=== TWITTER ==="));
        assert!(text.contains("=== LINKEDIN ==="));
        assert!(text.contains("--- Sample 2 ---\nthird"));
    }
}
