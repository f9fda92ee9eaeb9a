//! Scene definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Visual intent used when a section carries no header of its own.
pub const DEFAULT_VISUAL_INTENT: &str = "cinematic abstract";

/// Emotional tone of a scene, used as a search modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalTone {
    Dark,
    Calm,
    Tense,
    Inspirational,
    Mysterious,
    Energetic,
    #[default]
    Neutral,
}

impl EmotionalTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalTone::Dark => "dark",
            EmotionalTone::Calm => "calm",
            EmotionalTone::Tense => "tense",
            EmotionalTone::Inspirational => "inspirational",
            EmotionalTone::Mysterious => "mysterious",
            EmotionalTone::Energetic => "energetic",
            EmotionalTone::Neutral => "neutral",
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, EmotionalTone::Neutral)
    }
}

impl fmt::Display for EmotionalTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmotionalTone {
    type Err = ToneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(EmotionalTone::Dark),
            "calm" => Ok(EmotionalTone::Calm),
            "tense" => Ok(EmotionalTone::Tense),
            "inspirational" => Ok(EmotionalTone::Inspirational),
            "mysterious" => Ok(EmotionalTone::Mysterious),
            "energetic" => Ok(EmotionalTone::Energetic),
            "neutral" => Ok(EmotionalTone::Neutral),
            _ => Err(ToneParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown emotional tone: {0}")]
pub struct ToneParseError(String);

/// One timed unit of narration plus matched visual content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// 1-based playback position
    #[validate(range(min = 1))]
    pub scene_number: u32,

    /// Target duration in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub duration_seconds: f64,

    /// Narration assigned to this scene
    pub narration_text: String,

    /// Free-text description driving asset search or generation
    pub visual_intent: String,

    #[serde(default)]
    pub emotional_tone: EmotionalTone,

    /// Search keywords, highest priority first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Scene {
    /// Create a neutral-toned scene without keywords.
    pub fn new(
        scene_number: u32,
        duration_seconds: f64,
        narration_text: impl Into<String>,
        visual_intent: impl Into<String>,
    ) -> Self {
        Self {
            scene_number,
            duration_seconds,
            narration_text: narration_text.into(),
            visual_intent: visual_intent.into(),
            emotional_tone: EmotionalTone::Neutral,
            keywords: Vec::new(),
        }
    }

    pub fn with_tone(mut self, tone: EmotionalTone) -> Self {
        self.emotional_tone = tone;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Check the numbering and duration constraints.
    ///
    /// `validate()` alone accepts NaN durations, so finiteness is checked here.
    pub fn validate_timing(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        if !self.duration_seconds.is_finite() {
            let mut errors = validator::ValidationErrors::new();
            errors.add(
                "duration_seconds",
                validator::ValidationError::new("not_finite"),
            );
            return Err(errors);
        }
        Ok(())
    }

    /// Zero-based index derived from the scene number.
    pub fn index(&self) -> usize {
        self.scene_number.saturating_sub(1) as usize
    }

    /// Duration rounded to whole seconds, never below one second.
    ///
    /// Render calls only accept whole seconds.
    pub fn rounded_duration(&self) -> u32 {
        round_duration(self.duration_seconds)
    }
}

/// Round a duration to whole seconds, never below one second.
pub fn round_duration(seconds: f64) -> u32 {
    if !seconds.is_finite() {
        return 1;
    }
    seconds.round().max(1.0) as u32
}

/// Total duration of a scene sequence.
pub fn total_duration(scenes: &[Scene]) -> f64 {
    scenes.iter().map(|s| s.duration_seconds).sum()
}

/// Check that scene numbers run 1..=N in order.
pub fn is_contiguous(scenes: &[Scene]) -> bool {
    scenes
        .iter()
        .enumerate()
        .all(|(i, s)| s.scene_number as usize == i + 1)
}
