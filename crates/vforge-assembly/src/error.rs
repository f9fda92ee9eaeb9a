//! Assembly error types.

use thiserror::Error;
use vforge_media::MediaError;
use vforge_providers::ProviderError;

pub type AssemblyResult<T> = Result<T, AssemblyError>;

#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Script has no narration text")]
    ScriptEmpty,

    #[error("Invalid audio duration: {0}")]
    InvalidAudioDuration(f64),

    #[error("Asset resolution failed for scene {scene_number}: {cause}")]
    AssetResolution {
        scene_number: u32,
        #[source]
        cause: ProviderError,
    },

    #[error("Rendering failed for scene {scene_number}: {cause}")]
    SceneRender {
        scene_number: u32,
        #[source]
        cause: MediaError,
    },

    #[error("Concatenation failed: {0}")]
    Concatenation(#[source] MediaError),

    #[error("Audio mux failed: {0}")]
    Mux(#[source] MediaError),

    #[error("Timed out after {seconds} seconds{}", scene_suffix(*scene_number))]
    Timeout {
        scene_number: Option<u32>,
        seconds: u64,
    },

    #[error("Assembly cancelled")]
    Cancelled,

    #[error("Media engine error: {0}")]
    Engine(#[source] MediaError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn scene_suffix(scene_number: Option<u32>) -> String {
    scene_number
        .map(|n| format!(" (scene {})", n))
        .unwrap_or_default()
}

impl AssemblyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Scene-scoped provider failure, keeping timeouts distinct.
    pub fn from_provider(scene_number: u32, err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(seconds) => Self::Timeout {
                scene_number: Some(scene_number),
                seconds,
            },
            cause => Self::AssetResolution {
                scene_number,
                cause,
            },
        }
    }

    /// Map an engine failure, lifting cancellation and timeouts out of `wrap`.
    pub fn from_media(
        err: MediaError,
        scene_number: Option<u32>,
        wrap: impl FnOnce(MediaError) -> AssemblyError,
    ) -> Self {
        match err {
            MediaError::Cancelled => Self::Cancelled,
            MediaError::Timeout(seconds) => Self::Timeout {
                scene_number,
                seconds,
            },
            other => wrap(other),
        }
    }

    /// Check if re-running the assembly may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssemblyError::AssetResolution { .. } | AssemblyError::Timeout { .. } => true,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AssemblyError::Timeout { .. })
    }

    /// Scene the failure is attributed to, if any.
    pub fn scene_number(&self) -> Option<u32> {
        match self {
            AssemblyError::AssetResolution { scene_number, .. }
            | AssemblyError::SceneRender { scene_number, .. } => Some(*scene_number),
            AssemblyError::Timeout { scene_number, .. } => *scene_number,
            _ => None,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AssemblyError::ScriptEmpty => "script_empty",
            AssemblyError::InvalidAudioDuration(_) => "invalid_audio_duration",
            AssemblyError::AssetResolution { .. } => "asset_resolution",
            AssemblyError::SceneRender { .. } => "scene_render",
            AssemblyError::Concatenation(_) => "concatenation",
            AssemblyError::Mux(_) => "mux",
            AssemblyError::Timeout { .. } => "timeout",
            AssemblyError::Cancelled => "cancelled",
            AssemblyError::Engine(_) => "engine",
            AssemblyError::Config(_) => "config",
        }
    }
}
