//! Assembly orchestration.
//!
//! Drives one run from scenes (or pre-resolved assets) to a muxed MP4:
//! resolve, render each scene in order, concatenate, mux narration, export.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, warn, Instrument};
use vforge_media::{concatenate, mux::audio_file_name, mux_audio, render_segment, MediaEngine, SegmentInput};
use vforge_models::{
    AssemblyStage, EncodingConfig, FinalAsset, Orientation, ResolvedAsset, RunId, Scene, VisualMode,
};
use vforge_providers::{AssetFetcher, NarrationAudio};

use crate::config::AssemblyConfig;
use crate::error::{AssemblyError, AssemblyResult};
use crate::logging::RunLogger;
use crate::metrics::{record_run, record_scene_rendered};
use crate::progress::{
    scene_progress, ProgressReporter, ProgressSink, AUDIO_PERCENT, DONE_PERCENT, EXPORT_PERCENT,
    INIT_PERCENT, MERGE_PERCENT, RESOLVE_PERCENT,
};
use crate::resolver::AssetResolver;
use crate::segmenter::{estimate_narration_seconds, plan_scenes};

/// A scene paired with the asset chosen for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScene {
    pub scene: Scene,
    pub asset: ResolvedAsset,
}

/// What an assembly run starts from.
#[derive(Debug, Clone)]
pub enum AssemblyInput {
    /// Scenes still needing assets
    Scenes(Vec<Scene>),
    /// Scenes whose assets were chosen ahead of time
    Resolved(Vec<ResolvedScene>),
}

impl AssemblyInput {
    pub fn len(&self) -> usize {
        match self {
            AssemblyInput::Scenes(scenes) => scenes.len(),
            AssemblyInput::Resolved(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Narration track muxed under the video.
#[derive(Clone, PartialEq)]
pub struct NarrationInput {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. "mp3"
    pub extension: String,
}

impl NarrationInput {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
        }
    }
}

impl From<NarrationAudio> for NarrationInput {
    fn from(audio: NarrationAudio) -> Self {
        let extension = audio.extension().to_string();
        Self {
            bytes: audio.bytes,
            extension,
        }
    }
}

impl std::fmt::Debug for NarrationInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationInput")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("extension", &self.extension)
            .finish()
    }
}

/// Runs one assembly on an owned media engine.
///
/// `assemble` consumes the assembler, so the engine and its workspace are
/// released on every exit path.
pub struct Assembler<E: MediaEngine> {
    engine: E,
    config: AssemblyConfig,
    resolver: Option<AssetResolver>,
    fetcher: Option<Arc<dyn AssetFetcher>>,
    progress: ProgressReporter,
    cancel: Option<watch::Receiver<bool>>,
    run_id: RunId,
}

impl<E: MediaEngine> Assembler<E> {
    pub fn new(engine: E, config: AssemblyConfig) -> Self {
        Self {
            engine,
            config,
            resolver: None,
            fetcher: None,
            progress: ProgressReporter::default(),
            cancel: None,
            run_id: RunId::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: AssetResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Downloader for asset bytes.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.progress = ProgressReporter::new(Some(sink));
        self
    }

    /// Abort between stages once the signal flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel_rx);
        self
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Probe the narration's duration through the engine.
    pub async fn probe_audio_duration(&mut self, audio: &NarrationInput) -> AssemblyResult<f64> {
        let name = format!("probe_{}", audio_file_name(&audio.extension));
        self.engine
            .write_file(&name, &audio.bytes)
            .await
            .map_err(AssemblyError::Engine)?;

        let probed = self.engine.probe_duration(&name).await;
        if let Err(e) = self.engine.delete_file(&name).await {
            warn!("Failed to delete probed narration {}: {}", name, e);
        }

        let duration = probed.map_err(AssemblyError::Engine)?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AssemblyError::InvalidAudioDuration(duration));
        }
        Ok(duration)
    }

    /// Segment a script against its narration, then assemble.
    ///
    /// Falls back to a words-per-minute estimate when the narration cannot
    /// be probed.
    pub async fn assemble_script(
        mut self,
        script_text: &str,
        audio: NarrationInput,
        mode: VisualMode,
        orientation: Orientation,
    ) -> AssemblyResult<FinalAsset> {
        let total = match self.probe_audio_duration(&audio).await {
            Ok(duration) => duration,
            Err(AssemblyError::Engine(e)) => {
                let estimate = estimate_narration_seconds(script_text);
                warn!(error = %e, estimate, "Narration probe failed, estimating from word count");
                estimate
            }
            Err(e) => return Err(e),
        };

        let scenes = plan_scenes(script_text, total, mode, &self.config)?;
        self.assemble(AssemblyInput::Scenes(scenes), audio, mode, orientation)
            .await
    }

    /// Assemble the final video.
    pub async fn assemble(
        mut self,
        input: AssemblyInput,
        audio: NarrationInput,
        mode: VisualMode,
        orientation: Orientation,
    ) -> AssemblyResult<FinalAsset> {
        let logger = RunLogger::new(&self.run_id, "assemble");
        let span = logger.create_span();

        logger.log_start(&format!("{} scenes, mode {}, {}", input.len(), mode, orientation));
        let result = self
            .run(input, audio, mode, orientation, &logger)
            .instrument(span)
            .await;

        match &result {
            Ok(asset) => {
                record_run("success");
                logger.log_completion(&format!(
                    "{} bytes, {:.2}s",
                    asset.len(),
                    asset.duration_seconds
                ));
            }
            Err(e) => {
                record_run(e.kind());
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn run(
        &mut self,
        input: AssemblyInput,
        audio: NarrationInput,
        mode: VisualMode,
        orientation: Orientation,
        logger: &RunLogger,
    ) -> AssemblyResult<FinalAsset> {
        self.progress
            .report(AssemblyStage::Init, INIT_PERCENT, "Preparing assembly");
        self.check_cancelled()?;

        let items = match input {
            AssemblyInput::Resolved(items) => items,
            AssemblyInput::Scenes(scenes) => {
                let scenes = ordered_scenes(scenes)?;
                self.progress.report(
                    AssemblyStage::Download,
                    RESOLVE_PERCENT,
                    format!("Finding visuals for {} scenes", scenes.len()),
                );
                let resolver = self.resolver.as_ref().ok_or_else(|| {
                    AssemblyError::config("assembling unresolved scenes requires an asset resolver")
                })?;
                let assets = resolver.resolve_all(&scenes, mode, orientation).await?;
                scenes
                    .into_iter()
                    .zip(assets)
                    .map(|(scene, asset)| ResolvedScene { scene, asset })
                    .collect()
            }
        };
        let items = ordered_items(items)?;

        let encoding = EncodingConfig::for_orientation(orientation);
        let total = items.len();
        let mut segments = Vec::with_capacity(total);

        for (i, item) in items.iter().enumerate() {
            self.check_cancelled()?;
            let scene_number = item.scene.scene_number;
            self.progress.report(
                AssemblyStage::Process,
                scene_progress(i, total),
                format!("Rendering scene {}/{}", i + 1, total),
            );

            let bytes = fetch_asset(self.fetcher.as_ref(), &item.asset, scene_number).await?;
            let started = Instant::now();
            let segment = render_segment(
                &mut self.engine,
                SegmentInput {
                    asset: &item.asset,
                    bytes: &bytes,
                },
                item.scene.duration_seconds,
                i,
                &encoding,
            )
            .await
            .map_err(|e| {
                AssemblyError::from_media(e, Some(scene_number), |cause| {
                    AssemblyError::SceneRender {
                        scene_number,
                        cause,
                    }
                })
            })?;

            record_scene_rendered(started.elapsed());
            logger.log_scene(scene_number, total, "rendered");
            segments.push(segment);
        }

        self.check_cancelled()?;
        self.progress
            .report(AssemblyStage::Merge, MERGE_PERCENT, "Merging scenes");
        let silent = concatenate(&mut self.engine, &segments)
            .await
            .map_err(|e| AssemblyError::from_media(e, None, AssemblyError::Concatenation))?;

        self.check_cancelled()?;
        self.progress
            .report(AssemblyStage::Audio, AUDIO_PERCENT, "Adding narration");
        let muxed = mux_audio(
            &mut self.engine,
            &silent,
            &audio.bytes,
            &audio.extension,
            &encoding,
        )
        .await
        .map_err(|e| AssemblyError::from_media(e, None, AssemblyError::Mux))?;

        self.progress
            .report(AssemblyStage::Export, EXPORT_PERCENT, "Exporting video");
        let bytes = self
            .engine
            .read_file(&muxed)
            .await
            .map_err(AssemblyError::Engine)?;
        let duration = self
            .engine
            .probe_duration(&muxed)
            .await
            .map_err(AssemblyError::Engine)?;

        self.progress
            .report(AssemblyStage::Done, DONE_PERCENT, "Video ready");
        debug!(bytes = bytes.len(), duration, "Exported final video");

        Ok(FinalAsset::mp4(bytes, duration))
    }

    fn check_cancelled(&self) -> AssemblyResult<()> {
        match &self.cancel {
            Some(rx) if *rx.borrow() => Err(AssemblyError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Download a scene's source bytes.
///
/// Failures carry the provider cause as `AssetResolution`, so a failed
/// download is retryable like a failed search.
async fn fetch_asset(
    fetcher: Option<&Arc<dyn AssetFetcher>>,
    asset: &ResolvedAsset,
    scene_number: u32,
) -> AssemblyResult<Vec<u8>> {
    let fetcher =
        fetcher.ok_or_else(|| AssemblyError::config("assembly requires an asset fetcher"))?;
    fetcher
        .fetch(asset.source_uri())
        .await
        .map_err(|e| AssemblyError::from_provider(scene_number, e))
}

fn check_scene(scene: &Scene) -> AssemblyResult<()> {
    scene.validate_timing().map_err(|e| {
        AssemblyError::config(format!("invalid scene {}: {}", scene.scene_number, e))
    })
}

/// Validate scenes and sort them into playback order.
fn ordered_scenes(mut scenes: Vec<Scene>) -> AssemblyResult<Vec<Scene>> {
    if scenes.is_empty() {
        return Err(AssemblyError::ScriptEmpty);
    }
    scenes.iter().try_for_each(check_scene)?;
    scenes.sort_by_key(|s| s.scene_number);
    Ok(scenes)
}

fn ordered_items(mut items: Vec<ResolvedScene>) -> AssemblyResult<Vec<ResolvedScene>> {
    if items.is_empty() {
        return Err(AssemblyError::ScriptEmpty);
    }
    items.iter().try_for_each(|item| check_scene(&item.scene))?;
    items.sort_by_key(|item| item.scene.scene_number);
    Ok(items)
}
