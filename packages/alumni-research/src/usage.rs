//! Token usage accounting across every model call of one record.

use openai_client::Usage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// Content modality a token count is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Image => f.write_str("image"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// The five headline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    pub total: u64,
    pub prompt: u64,
    /// Tokens generated in answers
    pub candidates: u64,
    /// Prompt tokens served from cache
    pub cached: u64,
    /// Hidden reasoning tokens
    pub thoughts: u64,
}

impl UsageCounters {
    /// Best-effort extraction from one API usage block. Missing counters are 0.
    pub fn from_usage(usage: &Usage) -> Self {
        Self {
            total: usage.total_tokens,
            prompt: usage.prompt_tokens,
            candidates: usage.completion_tokens,
            cached: usage.cached_tokens(),
            thoughts: usage.reasoning_tokens(),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for UsageCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.prompt += rhs.prompt;
        self.candidates += rhs.candidates;
        self.cached += rhs.cached;
        self.thoughts += rhs.thoughts;
    }
}

/// Usage reported by one model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnUsage {
    pub stage: String,
    pub iteration: usize,
    pub counters: UsageCounters,
    pub prompt_by_modality: BTreeMap<Modality, u64>,
    pub cached_by_modality: BTreeMap<Modality, u64>,
}

impl TurnUsage {
    pub fn from_usage(stage: impl Into<String>, iteration: usize, usage: &Usage) -> Self {
        let mut prompt_by_modality = BTreeMap::new();
        let mut cached_by_modality = BTreeMap::new();

        if let Some(details) = &usage.prompt_tokens_details {
            for (modality, count) in [
                (Modality::Audio, details.audio_tokens),
                (Modality::Image, details.image_tokens),
            ] {
                if count > 0 {
                    prompt_by_modality.insert(modality, count);
                }
            }

            let text = if details.text_tokens > 0 {
                details.text_tokens
            } else {
                usage
                    .prompt_tokens
                    .saturating_sub(details.audio_tokens + details.image_tokens)
            };
            if text > 0 {
                prompt_by_modality.insert(Modality::Text, text);
            }

            // Cache hits are only reported in aggregate; attribute them to text
            if details.cached_tokens > 0 {
                cached_by_modality.insert(Modality::Text, details.cached_tokens);
            }
        }

        Self {
            stage: stage.into(),
            iteration,
            counters: UsageCounters::from_usage(usage),
            prompt_by_modality,
            cached_by_modality,
        }
    }
}

/// Running total for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub totals: UsageCounters,
    pub prompt_by_modality: BTreeMap<Modality, u64>,
    pub cached_by_modality: BTreeMap<Modality, u64>,
    pub turns: Vec<TurnUsage>,
}

impl UsageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one call's usage in. `None` (no usage metadata) is a no-op.
    pub fn record(&mut self, stage: &str, iteration: usize, usage: Option<&Usage>) {
        let Some(usage) = usage else {
            tracing::debug!(stage, iteration, "Turn carried no usage metadata");
            return;
        };
        self.add_turn(TurnUsage::from_usage(stage, iteration, usage));
    }

    pub fn add_turn(&mut self, turn: TurnUsage) {
        self.totals += turn.counters;
        for (modality, count) in &turn.prompt_by_modality {
            *self.prompt_by_modality.entry(*modality).or_default() += count;
        }
        for (modality, count) in &turn.cached_by_modality {
            *self.cached_by_modality.entry(*modality).or_default() += count;
        }
        tracing::debug!(
            stage = %turn.stage,
            iteration = turn.iteration,
            total_tokens = turn.counters.total,
            "Accumulated turn usage"
        );
        self.turns.push(turn);
    }
}
