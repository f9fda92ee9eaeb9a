//! Script segmentation into timed scenes.
//!
//! Two modes are supported:
//! - band mode ([`segment`]): the scene count follows from headed sections and
//!   the duration band, every scene gets the same clamped duration;
//! - fixed mode ([`segment_fixed`]): the caller picks the scene count, chunks
//!   follow sentence boundaries where possible and missing chunks are padded
//!   with filler scenes.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use vforge_models::{round_duration, Scene, VisualMode, DEFAULT_VISUAL_INTENT};

use crate::config::{AssemblyConfig, DriftPolicy, SceneConstraints};
use crate::error::{AssemblyError, AssemblyResult};

/// Average scene length used to size generated-image runs.
pub const AI_IMAGE_AVERAGE_SCENE_SECS: f64 = 8.0;

/// Speaking rate used when the narration cannot be probed.
pub const WORDS_PER_MINUTE: f64 = 150.0;

/// Longest visual intent derived from narration text.
pub const MAX_INTENT_CHARS: usize = 400;

/// Visual intents for scenes with no narration of their own.
pub const FILLER_INTENTS: &[&str] = &[
    "Cinematic landscape, professional photography, 4k, dramatic lighting",
    "Abstract modern background, professional, vibrant colors, high quality",
    "Cinematic cityscape, professional photography, ultra detailed",
    "Nature scene, professional, 4k, dramatic lighting, vibrant colors",
    "Tech background, futuristic, professional, high quality, 4k",
];

static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("valid sentence regex"));

/// How a script is cut into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// One chunk per headed section
    Structural,
    /// Exactly `n` chunks of whole sentences
    SentenceWindow(usize),
    /// Up to `n` chunks of words, for text with too few sentences
    WordWindow(usize),
}

/// A contiguous piece of narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Header text of the section the chunk came from
    pub section_title: Option<String>,
    pub text: String,
}

impl TextChunk {
    fn untitled(text: String) -> Self {
        Self {
            section_title: None,
            text,
        }
    }

    fn visual_intent(&self) -> &str {
        self.section_title.as_deref().unwrap_or(DEFAULT_VISUAL_INTENT)
    }
}

/// Pick the split strategy for a script.
///
/// Without a requested count the script is split structurally. With one,
/// sentence windows are used when there are enough sentences to fill every
/// chunk, word windows otherwise.
pub fn select_strategy(text: &str, requested_scene_count: Option<usize>) -> SplitStrategy {
    match requested_scene_count {
        None => SplitStrategy::Structural,
        Some(count) => {
            let count = count.max(1);
            if sentences(text).len() >= count {
                SplitStrategy::SentenceWindow(count)
            } else {
                SplitStrategy::WordWindow(count)
            }
        }
    }
}

/// Split a script into ordered chunks. Empty chunks are never returned.
pub fn split_script(text: &str, strategy: SplitStrategy) -> Vec<TextChunk> {
    match strategy {
        SplitStrategy::Structural => parse_sections(text),
        SplitStrategy::SentenceWindow(count) => {
            let sentences = sentences(text);
            spread(&sentences, count)
                .into_iter()
                .filter(|group| !group.is_empty())
                .map(|group| TextChunk::untitled(group.join(" ")))
                .collect()
        }
        SplitStrategy::WordWindow(count) => split_words(text, count)
            .into_iter()
            .map(TextChunk::untitled)
            .collect(),
    }
}

/// Split a script into scenes whose count follows from the duration band.
pub fn segment(
    script_text: &str,
    total_audio_duration_seconds: f64,
    constraints: &SceneConstraints,
) -> AssemblyResult<Vec<Scene>> {
    check_inputs(script_text, total_audio_duration_seconds)?;
    constraints.validate_band()?;

    let mut chunks = split_script(script_text, SplitStrategy::Structural);
    if chunks.is_empty() {
        return Err(AssemblyError::ScriptEmpty);
    }

    let total = total_audio_duration_seconds;
    let min_required = (total / constraints.max_seconds).ceil() as usize;
    let provisional = chunks.len();

    if provisional < min_required {
        let split_factor = min_required.div_ceil(provisional);
        info!(
            provisional,
            min_required,
            split_factor,
            total_seconds = total,
            "Splitting sections to cover narration"
        );
        chunks = chunks
            .into_iter()
            .flat_map(|chunk| {
                let title = chunk.section_title;
                split_words(&chunk.text, split_factor)
                    .into_iter()
                    .map(move |text| TextChunk {
                        section_title: title.clone(),
                        text,
                    })
            })
            .collect();

        if chunks.len() < min_required {
            warn!(
                scenes = chunks.len(),
                min_required, "Script has too few words to reach the required scene count"
            );
        }
    }

    let count = chunks.len();
    let duration = match constraints.drift {
        DriftPolicy::Accept => {
            (total / count as f64).clamp(constraints.min_seconds, constraints.max_seconds)
        }
        DriftPolicy::Renormalize => total / count as f64,
    };

    debug!(
        scenes = count,
        duration,
        drift = %constraints.drift,
        "Assigned scene durations"
    );

    Ok(chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            Scene::new(
                (i + 1) as u32,
                duration,
                chunk.text.clone(),
                chunk.visual_intent(),
            )
        })
        .collect())
}

/// Split a script into exactly `scene_count` scenes.
///
/// Header lines are not narration and are skipped. When the text yields
/// fewer chunks than requested, filler scenes pad the end. Fillers take the
/// minimum duration; the remaining audio is spread over the real scenes in
/// one pass, each rounded to whole seconds.
pub fn segment_fixed(
    script_text: &str,
    total_audio_duration_seconds: f64,
    scene_count: usize,
    constraints: &SceneConstraints,
) -> AssemblyResult<Vec<Scene>> {
    check_inputs(script_text, total_audio_duration_seconds)?;
    constraints.validate_band()?;
    if scene_count == 0 {
        return Err(AssemblyError::config("scene count must be at least 1"));
    }

    let body = narration_body(script_text);
    let strategy = select_strategy(&body, Some(scene_count));
    let chunks = split_script(&body, strategy);

    let real = chunks.len().min(scene_count);
    let fillers = scene_count - real;
    if fillers > 0 {
        debug!(real, fillers, "Padding script with filler scenes");
    }

    let mut remaining = total_audio_duration_seconds - fillers as f64 * constraints.min_seconds;
    let mut scenes = Vec::with_capacity(scene_count);

    for (i, chunk) in chunks.into_iter().take(real).enumerate() {
        let share = remaining / (real - i) as f64;
        let duration =
            round_duration(share.clamp(constraints.min_seconds, constraints.max_seconds)) as f64;
        remaining -= duration;

        let intent: String = chunk.text.chars().take(MAX_INTENT_CHARS).collect();
        scenes.push(Scene::new((i + 1) as u32, duration, chunk.text, intent));
    }

    for i in real..scene_count {
        scenes.push(Scene::new(
            (i + 1) as u32,
            constraints.min_seconds,
            "",
            FILLER_INTENTS[i % FILLER_INTENTS.len()],
        ));
    }

    info!(
        scenes = scenes.len(),
        strategy = ?strategy,
        total_seconds = total_audio_duration_seconds,
        "Segmented script into fixed scene count"
    );
    Ok(scenes)
}

/// Scene count for generated-image runs.
pub fn ai_image_scene_count(total_audio_duration_seconds: f64) -> usize {
    if !total_audio_duration_seconds.is_finite() || total_audio_duration_seconds <= 0.0 {
        return 1;
    }
    ((total_audio_duration_seconds / AI_IMAGE_AVERAGE_SCENE_SECS).ceil() as usize).max(1)
}

/// Estimate narration length from the word count.
pub fn estimate_narration_seconds(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    (words / WORDS_PER_MINUTE * 60.0).round()
}

/// Segment a script the way a run in `mode` expects.
///
/// Stock runs use band mode; generated-image runs use a fixed count of
/// roughly eight-second scenes.
pub fn plan_scenes(
    script_text: &str,
    total_audio_duration_seconds: f64,
    mode: VisualMode,
    config: &AssemblyConfig,
) -> AssemblyResult<Vec<Scene>> {
    let constraints = config.constraints_for(mode);
    match mode {
        VisualMode::StockClip => segment(script_text, total_audio_duration_seconds, &constraints),
        VisualMode::AiImage | VisualMode::AiClip => segment_fixed(
            script_text,
            total_audio_duration_seconds,
            ai_image_scene_count(total_audio_duration_seconds),
            &constraints,
        ),
    }
}

fn check_inputs(script_text: &str, total: f64) -> AssemblyResult<()> {
    if !total.is_finite() || total <= 0.0 {
        return Err(AssemblyError::InvalidAudioDuration(total));
    }
    if script_text.trim().is_empty() {
        return Err(AssemblyError::ScriptEmpty);
    }
    Ok(())
}

fn header_text(line: &str) -> Option<&str> {
    line.strip_prefix('#')
        .map(|rest| rest.trim_start_matches('#').trim())
}

fn parse_sections(text: &str) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut title: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match header_text(line) {
            Some(header) => {
                if !body.is_empty() {
                    chunks.push(TextChunk {
                        section_title: title.clone(),
                        text: body.join(" "),
                    });
                    body.clear();
                }
                title = Some(header.to_string()).filter(|h| !h.is_empty());
            }
            None => body.push(line),
        }
    }

    if !body.is_empty() {
        chunks.push(TextChunk {
            section_title: title,
            text: body.join(" "),
        });
    }
    chunks
}

fn narration_body(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && header_text(l).is_none())
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split words into `count` near-equal chunks, dropping empty ones.
fn split_words(text: &str, count: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    spread(&words, count)
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| group.join(" "))
        .collect()
}

/// Cut `items` into `count` consecutive groups whose sizes differ by at most
/// one, larger groups first. Groups are empty when items run out.
fn spread<T>(items: &[T], count: usize) -> Vec<&[T]> {
    let count = count.max(1);
    let base = items.len() / count;
    let extra = items.len() % count;

    let mut groups = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let len = base + usize::from(i < extra);
        groups.push(&items[start..start + len]);
        start += len;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use vforge_models::{is_contiguous, total_duration};

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    fn two_section_script() -> String {
        format!("# Ocean at dawn\n{}\n\n# City lights\n{}\n", words(40), words(40))
    }

    #[test]
    fn test_empty_script() {
        let band = SceneConstraints::stock_clip();
        assert!(matches!(segment("", 60.0, &band), Err(AssemblyError::ScriptEmpty)));
        assert!(matches!(segment("  \n\t ", 60.0, &band), Err(AssemblyError::ScriptEmpty)));
        assert!(matches!(
            segment_fixed("", 60.0, 3, &band),
            Err(AssemblyError::ScriptEmpty)
        ));
        assert!(matches!(
            segment("# Only a header\n", 60.0, &band),
            Err(AssemblyError::ScriptEmpty)
        ));
    }

    #[test]
    fn test_invalid_audio_duration() {
        let band = SceneConstraints::stock_clip();
        for total in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                segment("Some narration.", total, &band),
                Err(AssemblyError::InvalidAudioDuration(_))
            ));
        }
    }

    #[test]
    fn test_two_sections_split_to_cover_audio() {
        let band = SceneConstraints::stock_clip();
        let scenes = segment(&two_section_script(), 100.0, &band).unwrap();

        assert!(scenes.len() >= 9);
        assert!(is_contiguous(&scenes));
        for scene in &scenes {
            assert!((8.0..=12.0).contains(&scene.duration_seconds));
        }
        assert!((total_duration(&scenes) - 100.0).abs() <= 1.0);

        // Each section becomes ceil(9 / 2) = 5 scenes, keeping its header
        assert_eq!(scenes.len(), 10);
        assert!(scenes[..5].iter().all(|s| s.visual_intent == "Ocean at dawn"));
        assert!(scenes[5..].iter().all(|s| s.visual_intent == "City lights"));
    }

    #[test]
    fn test_split_keeps_every_word_in_order() {
        let script = format!("# Forest\n{}", words(23));
        let scenes = segment(&script, 60.0, &SceneConstraints::stock_clip()).unwrap();

        assert_eq!(scenes.len(), 5);
        let rejoined: Vec<&str> = scenes
            .iter()
            .flat_map(|s| s.narration_text.split_whitespace())
            .collect();
        assert_eq!(rejoined.join(" "), words(23));
    }

    #[test]
    fn test_structural_parsing() {
        let script = "Intro line before any header.\n\
                      # Mountains\n\
                      First body line.\n\
                      Second body line.\n\
                      ## Empty section\n\
                      ### Desert\n\
                      Sand everywhere.\n";
        let chunks = split_script(script, SplitStrategy::Structural);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].section_title, None);
        assert_eq!(chunks[0].visual_intent(), DEFAULT_VISUAL_INTENT);
        assert_eq!(chunks[1].section_title.as_deref(), Some("Mountains"));
        assert_eq!(chunks[1].text, "First body line. Second body line.");
        assert_eq!(chunks[2].section_title.as_deref(), Some("Desert"));
    }

    #[test]
    fn test_durations_within_band() {
        let script = words(300);
        for band in [SceneConstraints::stock_clip(), SceneConstraints::ai_image()] {
            for total in [9.0, 30.0, 45.2, 100.0, 333.0, 600.0] {
                let scenes = segment(&script, total, &band).unwrap();
                for scene in &scenes {
                    assert!(scene.duration_seconds >= band.min_seconds);
                    assert!(scene.duration_seconds <= band.max_seconds);
                }
            }
        }
    }

    #[test]
    fn test_accept_drift_is_bounded() {
        let script = words(300);
        let band = SceneConstraints::stock_clip();
        for total in [9.0, 15.0, 30.0, 45.2, 100.0, 333.0, 600.0] {
            let scenes = segment(&script, total, &band).unwrap();
            let sum = total_duration(&scenes);
            let n = scenes.len() as f64;

            assert!(sum >= total - 1e-9, "sum {sum} below total {total}");
            let bound = (n * band.min_seconds - total).max(0.0);
            assert!(sum - total <= bound + 1e-9, "drift {} over bound {bound}", sum - total);
        }

        // 15 s over two scenes clamps 7.5 up to 8
        let scenes = segment(&script, 15.0, &band).unwrap();
        assert_eq!(total_duration(&scenes), 16.0);
    }

    #[test]
    fn test_renormalize_sums_exactly() {
        let script = words(300);
        let band = SceneConstraints::stock_clip().with_drift(DriftPolicy::Renormalize);
        for total in [9.0, 15.0, 45.2, 100.0, 333.0] {
            let scenes = segment(&script, total, &band).unwrap();
            assert!((total_duration(&scenes) - total).abs() < 1e-6);
        }
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let script = two_section_script();
        let band = SceneConstraints::stock_clip();
        assert_eq!(
            segment(&script, 100.0, &band).unwrap(),
            segment(&script, 100.0, &band).unwrap()
        );

        let ai = SceneConstraints::ai_image();
        assert_eq!(
            segment_fixed(&script, 47.0, 6, &ai).unwrap(),
            segment_fixed(&script, 47.0, 6, &ai).unwrap()
        );
    }

    #[test]
    fn test_select_strategy() {
        let text = "One. Two! Three?";
        assert_eq!(select_strategy(text, None), SplitStrategy::Structural);
        assert_eq!(select_strategy(text, Some(2)), SplitStrategy::SentenceWindow(2));
        assert_eq!(select_strategy(text, Some(3)), SplitStrategy::SentenceWindow(3));
        assert_eq!(select_strategy(text, Some(4)), SplitStrategy::WordWindow(4));
    }

    #[test]
    fn test_sentence_windows_drop_nothing() {
        let text = "First one. Second one! Third one? Fourth one. Fifth one.";
        let chunks = split_script(text, SplitStrategy::SentenceWindow(2));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First one. Second one! Third one?");
        assert_eq!(chunks[1].text, "Fourth one. Fifth one.");
    }

    #[test]
    fn test_fixed_mode_pads_with_fillers() {
        let band = SceneConstraints::ai_image();
        let scenes = segment_fixed("Hello world.", 30.0, 4, &band).unwrap();

        assert_eq!(scenes.len(), 4);
        assert!(is_contiguous(&scenes));
        assert_eq!(scenes[0].narration_text, "Hello");
        assert_eq!(scenes[1].narration_text, "world.");
        assert!(scenes[2].narration_text.is_empty());
        assert_eq!(scenes[2].visual_intent, FILLER_INTENTS[2]);
        assert_eq!(scenes[3].visual_intent, FILLER_INTENTS[3]);
        assert!(scenes[2].emotional_tone.is_neutral());

        let durations: Vec<f64> = scenes.iter().map(|s| s.duration_seconds).collect();
        assert_eq!(durations, vec![10.0, 10.0, 5.0, 5.0]);
    }

    #[test]
    fn test_fixed_mode_redistributes_whole_seconds() {
        let script = "One sentence here. Two sentence here. Three sentence here. \
                      Four sentence here. Five sentence here. Six sentence here.";
        let scenes = segment_fixed(script, 47.0, 6, &SceneConstraints::ai_image()).unwrap();

        let durations: Vec<f64> = scenes.iter().map(|s| s.duration_seconds).collect();
        assert_eq!(durations, vec![8.0, 8.0, 8.0, 8.0, 8.0, 7.0]);
        assert_eq!(total_duration(&scenes), 47.0);
        assert_eq!(scenes[0].visual_intent, "One sentence here.");
    }

    #[test]
    fn test_fixed_mode_truncates_intent_and_skips_headers() {
        let long = "a".repeat(600);
        let script = format!("# Title\n{long}.");
        let scenes = segment_fixed(&script, 10.0, 1, &SceneConstraints::ai_image()).unwrap();

        assert_eq!(scenes[0].visual_intent.chars().count(), MAX_INTENT_CHARS);
        assert!(!scenes[0].narration_text.contains("Title"));
        assert!(segment_fixed("Text.", 10.0, 0, &SceneConstraints::ai_image()).is_err());
    }

    #[test]
    fn test_plan_scenes_by_mode() {
        let config = AssemblyConfig::default();
        let script = words(200);

        let stock = plan_scenes(&script, 45.0, VisualMode::StockClip, &config).unwrap();
        assert_eq!(stock.len(), 4);

        let images = plan_scenes(&script, 45.0, VisualMode::AiImage, &config).unwrap();
        assert_eq!(images.len(), ai_image_scene_count(45.0));
        assert_eq!(total_duration(&images), 45.0);
    }

    #[test]
    fn test_scene_count_and_estimate_helpers() {
        assert_eq!(ai_image_scene_count(45.0), 6);
        assert_eq!(ai_image_scene_count(8.0), 1);
        assert_eq!(ai_image_scene_count(0.5), 1);
        assert_eq!(ai_image_scene_count(f64::NAN), 1);

        assert_eq!(estimate_narration_seconds(&words(150)), 60.0);
        assert_eq!(estimate_narration_seconds(&words(25)), 10.0);
        assert_eq!(estimate_narration_seconds(""), 0.0);
    }
}
