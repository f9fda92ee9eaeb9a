//! Assembly configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::watch;
use validator::Validate;
use vforge_media::FfmpegEngine;
use vforge_models::VisualMode;

use crate::error::{AssemblyError, AssemblyResult};

/// Style suffix appended to every generated-image prompt.
pub const DEFAULT_MASTER_STYLE: &str =
    "cinematic photography, professional, high quality, 4k, ultra detailed, dramatic lighting, vibrant colors";

/// Output resolution requested from image-to-video models.
pub const DEFAULT_CLIP_RESOLUTION: &str = "720p";

/// What to do when clamping leaves scene durations off the audio total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftPolicy {
    /// Keep clamped durations; the sum may overshoot the audio
    #[default]
    Accept,
    /// Rescale after clamping so the sum equals the audio exactly
    Renormalize,
}

impl DriftPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriftPolicy::Accept => "accept",
            DriftPolicy::Renormalize => "renormalize",
        }
    }
}

impl fmt::Display for DriftPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DriftPolicy {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(DriftPolicy::Accept),
            "renormalize" | "renormalise" => Ok(DriftPolicy::Renormalize),
            other => Err(AssemblyError::config(format!("unknown drift policy '{other}'"))),
        }
    }
}

/// Duration band for scenes when the segmenter chooses the scene count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConstraints {
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub drift: DriftPolicy,
}

impl SceneConstraints {
    /// 8-12 s band used with stock footage.
    pub fn stock_clip() -> Self {
        Self {
            min_seconds: 8.0,
            max_seconds: 12.0,
            drift: DriftPolicy::Accept,
        }
    }

    /// 5-12 s band used with generated stills.
    pub fn ai_image() -> Self {
        Self {
            min_seconds: 5.0,
            max_seconds: 12.0,
            drift: DriftPolicy::Accept,
        }
    }

    pub fn for_mode(mode: VisualMode) -> Self {
        match mode {
            VisualMode::StockClip => Self::stock_clip(),
            VisualMode::AiImage | VisualMode::AiClip => Self::ai_image(),
        }
    }

    pub fn with_drift(mut self, drift: DriftPolicy) -> Self {
        self.drift = drift;
        self
    }

    pub fn validate_band(&self) -> AssemblyResult<()> {
        let valid = self.min_seconds.is_finite()
            && self.max_seconds.is_finite()
            && self.min_seconds > 0.0
            && self.max_seconds >= self.min_seconds;
        if !valid {
            return Err(AssemblyError::config(format!(
                "invalid scene band [{}, {}]",
                self.min_seconds, self.max_seconds
            )));
        }
        Ok(())
    }
}

/// Assembly configuration.
#[derive(Debug, Clone, Validate)]
pub struct AssemblyConfig {
    /// Override for the lower scene duration bound
    #[validate(range(exclusive_min = 0.0))]
    pub min_scene_secs: Option<f64>,
    /// Override for the upper scene duration bound
    #[validate(range(exclusive_min = 0.0))]
    pub max_scene_secs: Option<f64>,
    pub drift_policy: DriftPolicy,
    /// Maximum scenes resolved concurrently
    #[validate(range(min = 1))]
    pub max_parallel_resolutions: usize,
    /// Per-command FFmpeg timeout
    pub render_timeout: Option<Duration>,
    /// Parent directory for engine workspaces
    pub work_dir: Option<PathBuf>,
    /// Style suffix for generated-image prompts
    pub master_style: String,
    /// Recurring character appended to prompts for visual consistency
    pub character_description: Option<String>,
    pub clip_resolution: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            min_scene_secs: None,
            max_scene_secs: None,
            drift_policy: DriftPolicy::Accept,
            max_parallel_resolutions: 1,
            render_timeout: None,
            work_dir: None,
            master_style: DEFAULT_MASTER_STYLE.to_string(),
            character_description: None,
            clip_resolution: DEFAULT_CLIP_RESOLUTION.to_string(),
        }
    }
}

impl AssemblyConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            min_scene_secs: std::env::var("VFORGE_MIN_SCENE_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_scene_secs: std::env::var("VFORGE_MAX_SCENE_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            drift_policy: std::env::var("VFORGE_DRIFT_POLICY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            max_parallel_resolutions: std::env::var("VFORGE_MAX_PARALLEL_RESOLUTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            render_timeout: std::env::var("VFORGE_RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            work_dir: std::env::var("VFORGE_WORK_DIR").ok().map(PathBuf::from),
            master_style: std::env::var("VFORGE_MASTER_STYLE")
                .unwrap_or_else(|_| DEFAULT_MASTER_STYLE.to_string()),
            character_description: std::env::var("VFORGE_CHARACTER_DESCRIPTION")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            clip_resolution: std::env::var("VFORGE_CLIP_RESOLUTION")
                .unwrap_or_else(|_| DEFAULT_CLIP_RESOLUTION.to_string()),
        }
    }

    /// Load `.env` if present, then read the environment.
    pub fn load() -> AssemblyResult<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_env();
        config.validate_settings()?;
        Ok(config)
    }

    /// Check field ranges and the resulting scene bands.
    pub fn validate_settings(&self) -> AssemblyResult<()> {
        self.validate()
            .map_err(|e| AssemblyError::config(e.to_string()))?;
        for mode in [VisualMode::StockClip, VisualMode::AiImage] {
            self.constraints_for(mode).validate_band()?;
        }
        Ok(())
    }

    /// Scene band for `mode` with any overrides applied.
    pub fn constraints_for(&self, mode: VisualMode) -> SceneConstraints {
        let mut constraints = SceneConstraints::for_mode(mode).with_drift(self.drift_policy);
        if let Some(min) = self.min_scene_secs {
            constraints.min_seconds = min;
        }
        if let Some(max) = self.max_scene_secs {
            constraints.max_seconds = max;
        }
        constraints
    }

    /// Create an FFmpeg engine honoring the work dir and render timeout.
    pub fn create_engine(&self, cancel: Option<watch::Receiver<bool>>) -> AssemblyResult<FfmpegEngine> {
        let mut engine = match &self.work_dir {
            Some(dir) => FfmpegEngine::in_dir(dir),
            None => FfmpegEngine::new(),
        }
        .map_err(AssemblyError::Engine)?;

        if let Some(timeout) = self.render_timeout {
            engine = engine.with_timeout(timeout.as_secs().max(1));
        }
        if let Some(rx) = cancel {
            engine = engine.with_cancel(rx);
        }
        Ok(engine)
    }
}
