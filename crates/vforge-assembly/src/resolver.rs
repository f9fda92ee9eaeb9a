//! Per-scene visual asset resolution.
//!
//! Stock runs search for footage and loop or trim it to the scene; generated
//! runs create a still (optionally animated) from the scene's visual intent.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use futures::stream::{self, StreamExt, TryStreamExt};
use regex::Regex;
use tracing::{debug, info, warn};
use vforge_models::{
    ClipAsset, ImageAsset, MotionEffect, Orientation, ResolvedAsset, Scene, VisualMode,
    DEFAULT_VISUAL_INTENT,
};
use vforge_providers::{
    DurationBucket, ImageAnimator, ImageGenerator, ImageSize, ProviderError, VideoCandidate,
    VideoSearch,
};

use crate::config::AssemblyConfig;
use crate::error::{AssemblyError, AssemblyResult};
use crate::metrics::record_resolution;

pub const SEARCH_PAGE_SIZE: u32 = 10;
pub const POPULAR_PAGE_SIZE: u32 = 5;
pub const DEDUP_PAGE_SIZE: u32 = 15;

/// Last-resort query when a scene has neither intent nor keywords.
pub const DEDUP_FALLBACK_QUERY: &str = "cinematic";

/// Motion prompt sent to image-to-video models.
pub const CLIP_MOTION_PROMPT: &str =
    "Smooth, cinematic motion, natural movement, professional quality";

const STOP_WORDS: &[&str] = &[
    "ve", "veya", "ama", "için", "ile", "bu", "bir", "da", "de", "ki", "mi", "mu", "mı", "mü",
    "ne", "şu", "o", "and", "or", "but", "the", "a", "an", "in", "on", "at", "to", "for", "of",
    "with", "is", "are",
];

const MAX_EXTRACTED_KEYWORDS: usize = 5;

static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"));

/// Pull search keywords out of narration text.
///
/// Lowercases, replaces punctuation with spaces and keeps unique words
/// longer than three characters that are not stop words.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = PUNCTUATION_RE.replace_all(&lowered, " ");

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(*w))
        .take(MAX_EXTRACTED_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Stock search query: intent, top keyword, then tone unless neutral.
pub fn build_search_query(scene: &Scene) -> String {
    let mut parts: Vec<String> = Vec::new();

    let intent = scene.visual_intent.trim();
    if !intent.is_empty() {
        parts.push(intent.to_string());
    }

    let keyword = match scene.keywords.first() {
        Some(k) => Some(k.trim().to_string()),
        None => extract_keywords(&scene.narration_text).into_iter().next(),
    };
    if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
        parts.push(keyword);
    }

    if !scene.emotional_tone.is_neutral() {
        parts.push(scene.emotional_tone.as_str().to_string());
    }

    let query = parts.join(" ");
    if query.trim().is_empty() {
        DEFAULT_VISUAL_INTENT.to_string()
    } else {
        query
    }
}

/// Prompt decoration shared by every generated image in a run.
#[derive(Debug, Clone)]
pub struct PromptStyle {
    pub master_style: String,
    pub character_description: Option<String>,
    pub clip_resolution: String,
}

impl PromptStyle {
    pub fn from_config(config: &AssemblyConfig) -> Self {
        Self {
            master_style: config.master_style.clone(),
            character_description: config.character_description.clone(),
            clip_resolution: config.clip_resolution.clone(),
        }
    }
}

impl Default for PromptStyle {
    fn default() -> Self {
        Self::from_config(&AssemblyConfig::default())
    }
}

/// Image prompt: `intent, master style[, character]`.
pub fn build_image_prompt(scene: &Scene, style: &PromptStyle) -> String {
    let intent = match scene.visual_intent.trim() {
        "" => DEFAULT_VISUAL_INTENT,
        intent => intent,
    };

    let mut parts = vec![intent];
    if !style.master_style.trim().is_empty() {
        parts.push(style.master_style.trim());
    }
    if let Some(character) = style.character_description.as_deref().map(str::trim) {
        if !character.is_empty() {
            parts.push(character);
        }
    }
    parts.join(", ")
}

struct Resolution {
    asset: ResolvedAsset,
    /// Stock candidates the asset was picked from, kept for de-duplication
    candidates: Vec<VideoCandidate>,
}

/// Resolves scenes to visual assets through pluggable providers.
pub struct AssetResolver {
    video_search: Option<Arc<dyn VideoSearch>>,
    image_generator: Option<Arc<dyn ImageGenerator>>,
    image_animator: Option<Arc<dyn ImageAnimator>>,
    style: PromptStyle,
    max_parallel: usize,
}

impl AssetResolver {
    pub fn new(config: &AssemblyConfig) -> Self {
        Self {
            video_search: None,
            image_generator: None,
            image_animator: None,
            style: PromptStyle::from_config(config),
            max_parallel: config.max_parallel_resolutions.max(1),
        }
    }

    pub fn with_video_search(mut self, search: Arc<dyn VideoSearch>) -> Self {
        self.video_search = Some(search);
        self
    }

    pub fn with_image_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.image_generator = Some(generator);
        self
    }

    pub fn with_image_animator(mut self, animator: Arc<dyn ImageAnimator>) -> Self {
        self.image_animator = Some(animator);
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    pub fn style(&self) -> &PromptStyle {
        &self.style
    }

    /// Resolve a single scene.
    pub async fn resolve(
        &self,
        scene: &Scene,
        mode: VisualMode,
        orientation: Orientation,
    ) -> AssemblyResult<ResolvedAsset> {
        self.resolve_scene(scene, mode, orientation)
            .await
            .map(|resolution| resolution.asset)
    }

    /// Resolve every scene, preserving scene order.
    ///
    /// Any failure aborts the batch. Stock runs then replace repeated
    /// footage where an unused alternative can be found.
    pub async fn resolve_all(
        &self,
        scenes: &[Scene],
        mode: VisualMode,
        orientation: Orientation,
    ) -> AssemblyResult<Vec<ResolvedAsset>> {
        info!(
            scenes = scenes.len(),
            mode = %mode,
            max_parallel = self.max_parallel,
            "Resolving scene assets"
        );

        let mut resolutions: Vec<Resolution> = stream::iter(
            scenes
                .iter()
                .map(|scene| self.resolve_scene(scene, mode, orientation)),
        )
        .buffered(self.max_parallel)
        .try_collect()
        .await?;

        if mode == VisualMode::StockClip {
            self.deduplicate(scenes, &mut resolutions, orientation).await;
        }

        Ok(resolutions.into_iter().map(|r| r.asset).collect())
    }

    async fn resolve_scene(
        &self,
        scene: &Scene,
        mode: VisualMode,
        orientation: Orientation,
    ) -> AssemblyResult<Resolution> {
        let resolution = match mode {
            VisualMode::StockClip => self.resolve_stock(scene, orientation).await?,
            VisualMode::AiImage => {
                let url = self
                    .generate_image(scene, ImageSize::for_orientation(orientation))
                    .await?;
                Resolution {
                    asset: ResolvedAsset::Image(ImageAsset {
                        source_uri: url,
                        motion_effect: MotionEffect::for_scene(scene.index()),
                    }),
                    candidates: Vec::new(),
                }
            }
            VisualMode::AiClip => self.resolve_generated_clip(scene, orientation).await?,
        };

        record_resolution(mode);
        debug!(
            scene_number = scene.scene_number,
            source = resolution.asset.source_uri(),
            "Resolved scene asset"
        );
        Ok(resolution)
    }

    async fn resolve_stock(&self, scene: &Scene, orientation: Orientation) -> AssemblyResult<Resolution> {
        let search = self.require_search()?;
        let query = build_search_query(scene);
        let preferred_width = orientation.preferred_width();

        let mut candidates = search
            .search(&query, orientation, SEARCH_PAGE_SIZE)
            .await
            .map_err(|e| AssemblyError::from_provider(scene.scene_number, e))?;

        if !has_usable(&candidates) {
            warn!(
                scene_number = scene.scene_number,
                query = %query,
                "No stock results, falling back to popular videos"
            );
            candidates = search
                .popular(POPULAR_PAGE_SIZE)
                .await
                .map_err(|e| AssemblyError::from_provider(scene.scene_number, e))?;
        }

        let clip = pick_clip(&candidates, preferred_width, scene.duration_seconds, &HashSet::new())
            .ok_or_else(|| AssemblyError::AssetResolution {
                scene_number: scene.scene_number,
                cause: ProviderError::NoResults(query.clone()),
            })?;

        Ok(Resolution {
            asset: ResolvedAsset::Clip(clip),
            candidates,
        })
    }

    async fn resolve_generated_clip(
        &self,
        scene: &Scene,
        orientation: Orientation,
    ) -> AssemblyResult<Resolution> {
        let size = match orientation {
            Orientation::Portrait => ImageSize::portrait_720(),
            Orientation::Landscape => ImageSize::for_orientation(orientation),
        };
        let image_url = self.generate_image(scene, size).await?;

        let animator = self
            .image_animator
            .as_ref()
            .ok_or_else(|| AssemblyError::config("AI clip mode requires an image animator"))?;
        let bucket = DurationBucket::for_scene_seconds(scene.duration_seconds);

        let clip = animator
            .animate(&image_url, CLIP_MOTION_PROMPT, bucket, &self.style.clip_resolution)
            .await
            .map_err(|e| AssemblyError::from_provider(scene.scene_number, e))?;

        Ok(Resolution {
            asset: ResolvedAsset::Clip(ClipAsset::fitted(
                clip.url,
                None,
                bucket.seconds() as f64,
                scene.duration_seconds,
            )),
            candidates: Vec::new(),
        })
    }

    async fn generate_image(&self, scene: &Scene, size: ImageSize) -> AssemblyResult<String> {
        let generator = self
            .image_generator
            .as_ref()
            .ok_or_else(|| AssemblyError::config("generated-image modes require an image generator"))?;
        let prompt = build_image_prompt(scene, &self.style);

        let image = generator
            .generate(&prompt, size)
            .await
            .map_err(|e| AssemblyError::from_provider(scene.scene_number, e))?;
        Ok(image.url)
    }

    fn require_search(&self) -> AssemblyResult<&Arc<dyn VideoSearch>> {
        self.video_search
            .as_ref()
            .ok_or_else(|| AssemblyError::config("stock clip mode requires a video search provider"))
    }

    /// Swap footage that repeats an earlier scene's for an unused alternative.
    ///
    /// Each repeat first tries the rest of its own results, then re-queries
    /// once. When neither yields anything new the repeat is kept.
    async fn deduplicate(&self, scenes: &[Scene], resolutions: &mut [Resolution], orientation: Orientation) {
        let preferred_width = orientation.preferred_width();
        let mut used: HashSet<String> = HashSet::new();

        for (scene, resolution) in scenes.iter().zip(resolutions.iter_mut()) {
            let Some(id) = clip_id(&resolution.asset) else {
                continue;
            };

            if used.contains(&id) {
                let replacement = match pick_clip(
                    &resolution.candidates,
                    preferred_width,
                    scene.duration_seconds,
                    &used,
                ) {
                    Some(clip) => Some(clip),
                    None => self.requery_unused(scene, orientation, &used).await,
                };

                match replacement {
                    Some(clip) => {
                        debug!(
                            scene_number = scene.scene_number,
                            repeated = %id,
                            replacement = clip.source_id.as_deref().unwrap_or_default(),
                            "Replaced repeated stock clip"
                        );
                        resolution.asset = ResolvedAsset::Clip(clip);
                    }
                    None => debug!(
                        scene_number = scene.scene_number,
                        repeated = %id,
                        "No unused alternative, keeping repeated clip"
                    ),
                }
            }

            if let Some(final_id) = clip_id(&resolution.asset) {
                used.insert(final_id);
            }
        }
    }

    async fn requery_unused(
        &self,
        scene: &Scene,
        orientation: Orientation,
        used: &HashSet<String>,
    ) -> Option<ClipAsset> {
        let search = self.video_search.as_ref()?;
        let query = dedup_query(scene);

        match search.search(&query, orientation, DEDUP_PAGE_SIZE).await {
            Ok(candidates) => pick_clip(
                &candidates,
                orientation.preferred_width(),
                scene.duration_seconds,
                used,
            ),
            Err(e) => {
                warn!(
                    scene_number = scene.scene_number,
                    error = %e,
                    "De-duplication search failed"
                );
                None
            }
        }
    }
}

fn dedup_query(scene: &Scene) -> String {
    let intent = scene.visual_intent.trim();
    if !intent.is_empty() {
        return intent.to_string();
    }
    scene
        .keywords
        .first()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEDUP_FALLBACK_QUERY.to_string())
}

fn clip_id(asset: &ResolvedAsset) -> Option<String> {
    match asset {
        ResolvedAsset::Clip(clip) => clip.source_id.clone(),
        ResolvedAsset::Image(_) => None,
    }
}

fn has_usable(candidates: &[VideoCandidate]) -> bool {
    candidates.iter().any(|c| !c.files.is_empty())
}

/// First candidate with a downloadable file whose id is not in `skip`.
fn pick_clip(
    candidates: &[VideoCandidate],
    preferred_width: u32,
    scene_seconds: f64,
    skip: &HashSet<String>,
) -> Option<ClipAsset> {
    candidates
        .iter()
        .filter(|c| !skip.contains(&c.id))
        .find_map(|candidate| {
            candidate.best_file(preferred_width).map(|file| {
                ClipAsset::fitted(
                    file.link.clone(),
                    Some(candidate.id.clone()),
                    candidate.duration_seconds,
                    scene_seconds,
                )
            })
        })
}
