// ABOUTME: API pricing tables and cost computation in integer cents
// ABOUTME: Costs always round UP so the ledger never understates spend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

/// Token pricing for one chat model, in cents per million tokens
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_cents_per_million: i64,
    pub output_cents_per_million: i64,
}

/// Transcription pricing: $0.006 per minute of audio, i.e. one cent
/// per 100 seconds
const TRANSCRIPTION_SECONDS_PER_CENT: i64 = 100;

/// Pricing as of 2025. Models without an entry are not metered.
#[must_use]
pub fn chat_pricing(model: &str) -> Option<ModelPricing> {
    match model {
        // $2.50 per 1M input tokens, $10.00 per 1M output tokens
        "gpt-4o" => Some(ModelPricing {
            input_cents_per_million: 250,
            output_cents_per_million: 1_000,
        }),
        _ => None,
    }
}

/// Cost of a chat completion in cents, rounded up.
#[must_use]
pub const fn chat_cost_cents(pricing: ModelPricing, input_tokens: i64, output_tokens: i64) -> i64 {
    let scaled = input_tokens * pricing.input_cents_per_million
        + output_tokens * pricing.output_cents_per_million;
    (scaled + 999_999) / 1_000_000
}

/// Cost of a transcription in cents, rounded up from whole seconds.
#[must_use]
pub const fn transcription_cost_cents(duration_seconds: i64) -> i64 {
    (duration_seconds + TRANSCRIPTION_SECONDS_PER_CENT - 1) / TRANSCRIPTION_SECONDS_PER_CENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_cost_rounds_up() {
        let pricing = chat_pricing("gpt-4o").unwrap();
        // 1000 in + 500 out = 0.25c + 0.5c = 0.75c, rounds up to 1c
        assert_eq!(chat_cost_cents(pricing, 1_000, 500), 1);
        // 1M in + 1M out = 250c + 1000c exactly
        assert_eq!(chat_cost_cents(pricing, 1_000_000, 1_000_000), 1_250);
        // One token still bills a cent
        assert_eq!(chat_cost_cents(pricing, 1, 0), 1);
        assert_eq!(chat_cost_cents(pricing, 0, 0), 0);
    }

    #[test]
    fn test_transcription_cost_rounds_up() {
        // 60 minutes = 3600s = 36c
        assert_eq!(transcription_cost_cents(3_600), 36);
        // 101 seconds rounds up to 2c
        assert_eq!(transcription_cost_cents(101), 2);
        assert_eq!(transcription_cost_cents(100), 1);
        assert_eq!(transcription_cost_cents(1), 1);
        assert_eq!(transcription_cost_cents(0), 0);
    }

    #[test]
    fn test_unknown_model_is_unmetered() {
        assert!(chat_pricing("gpt-3.5-turbo").is_none());
    }
}
