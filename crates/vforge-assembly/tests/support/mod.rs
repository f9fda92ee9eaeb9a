//! In-memory engine and providers for orchestrator tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;
use vforge_media::{FfmpegCommand, MediaEngine, MediaError, MediaResult};
use vforge_models::{AssemblyProgress, Orientation};
use vforge_providers::{
    AssetFetcher, GeneratedImage, ImageGenerator, ImageSize, ProviderError, ProviderResult,
    VideoCandidate, VideoFile, VideoSearch,
};
use vforge_assembly::ProgressSink;

/// Bytes appended to the video by the fake mux step.
pub const NARRATION_MARKER: &[u8] = b"+narration";

#[derive(Default)]
pub struct FakeState {
    pub files: HashMap<String, Vec<u8>>,
    pub durations: HashMap<String, f64>,
    /// Arguments of every executed command, in order
    pub commands: Vec<Vec<String>>,
    pub audio_seconds: f64,
    /// Zero-based exec call that fails
    pub fail_exec_at: Option<usize>,
    pub fail_probe: bool,
    /// Flip the signal after this many exec calls
    pub cancel_after_execs: Option<(usize, watch::Sender<bool>)>,
}

impl FakeState {
    pub fn segment_commands(&self) -> usize {
        self.commands
            .iter()
            .filter(|args| args.last().is_some_and(|out| out.starts_with("scene_")))
            .count()
    }
}

/// Media engine that models FFmpeg outputs as byte markers.
///
/// Segments wrap their input bytes in brackets, concatenation joins them in
/// list order and the mux step appends [`NARRATION_MARKER`]. Durations follow
/// `-t`, sums and `min(video, audio)` respectively.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new(audio_seconds: f64) -> Self {
        let engine = Self::default();
        engine.state().audio_seconds = audio_seconds;
        engine
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail_exec_at(self, index: usize) -> Self {
        self.state().fail_exec_at = Some(index);
        self
    }

    pub fn fail_probe(self) -> Self {
        self.state().fail_probe = true;
        self
    }

    pub fn cancel_after(self, execs: usize, tx: watch::Sender<bool>) -> Self {
        self.state().cancel_after_execs = Some((execs, tx));
        self
    }
}

fn arg_after(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn input_names(args: &[String]) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == "-i")
        .map(|w| w[1].clone())
        .collect()
}

fn read(state: &FakeState, name: &str) -> MediaResult<Vec<u8>> {
    state
        .files
        .get(name)
        .cloned()
        .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> MediaResult<()> {
        let mut state = self.state();
        if name.contains("narration.") {
            let seconds = state.audio_seconds;
            state.durations.insert(name.to_string(), seconds);
        }
        state.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_file(&mut self, name: &str) -> MediaResult<Vec<u8>> {
        self.state()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }

    async fn delete_file(&mut self, name: &str) -> MediaResult<()> {
        let mut state = self.state();
        state.durations.remove(name);
        state
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }

    async fn exec(&mut self, command: &FfmpegCommand) -> MediaResult<()> {
        let mut state = self.state();
        let args = command.build_args();
        let call = state.commands.len();
        state.commands.push(args.clone());

        if let Some((after, tx)) = &state.cancel_after_execs {
            if call + 1 >= *after {
                let _ = tx.send(true);
            }
        }
        if state.fail_exec_at == Some(call) {
            return Err(MediaError::ffmpeg_failed("injected failure", None, Some(1)));
        }

        let output = command.output().display().to_string();
        let inputs = input_names(&args);
        let (bytes, seconds) = if output.starts_with("scene_") {
            let input = read(&state, &inputs[0])?;
            let seconds: f64 = arg_after(&args, "-t")
                .and_then(|t| t.parse().ok())
                .unwrap_or(0.0);
            ([b"[".as_slice(), input.as_slice(), b"]".as_slice()].concat(), seconds)
        } else if output == "concatenated.mp4" {
            let list = String::from_utf8(read(&state, &inputs[0])?).unwrap();
            let mut bytes = Vec::new();
            let mut seconds = 0.0;
            for line in list.lines() {
                let name = line
                    .strip_prefix("file '")
                    .and_then(|rest| rest.strip_suffix('\''))
                    .unwrap();
                bytes.extend(read(&state, name)?);
                seconds += state.durations.get(name).copied().unwrap_or(0.0);
            }
            (bytes, seconds)
        } else if output == "final.mp4" {
            let video = read(&state, &inputs[0])?;
            read(&state, &inputs[1])?;
            let video_secs = state.durations.get(&inputs[0]).copied().unwrap_or(0.0);
            let seconds = video_secs.min(state.audio_seconds);
            ([video.as_slice(), NARRATION_MARKER].concat(), seconds)
        } else {
            return Err(MediaError::internal(format!("unexpected output {output}")));
        };

        state.files.insert(output.clone(), bytes);
        state.durations.insert(output, seconds);
        Ok(())
    }

    async fn probe_duration(&mut self, name: &str) -> MediaResult<f64> {
        let state = self.state();
        if state.fail_probe && name.starts_with("probe_") {
            return Err(MediaError::ffprobe_failed("injected probe failure", None));
        }
        state
            .durations
            .get(name)
            .copied()
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }
}

/// Serves the URI itself as the asset bytes.
#[derive(Default)]
pub struct EchoFetcher {
    pub fetched: Mutex<Vec<String>>,
    pub failing_uri: Option<String>,
}

#[async_trait]
impl AssetFetcher for EchoFetcher {
    async fn fetch(&self, uri: &str) -> ProviderResult<Vec<u8>> {
        self.fetched.lock().unwrap().push(uri.to_string());
        if self.failing_uri.as_deref() == Some(uri) {
            return Err(ProviderError::RequestFailed {
                status: 404,
                body: "gone".to_string(),
            });
        }
        Ok(uri.as_bytes().to_vec())
    }
}

/// Serves fixed bytes per URI.
#[derive(Default)]
pub struct MapFetcher {
    pub assets: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl AssetFetcher for MapFetcher {
    async fn fetch(&self, uri: &str) -> ProviderResult<Vec<u8>> {
        self.assets
            .get(uri)
            .cloned()
            .ok_or_else(|| ProviderError::NoResults(uri.to_string()))
    }
}

/// Returns one candidate per query, named after the query.
pub struct QuerySearch;

#[async_trait]
impl VideoSearch for QuerySearch {
    async fn search(
        &self,
        query: &str,
        _orientation: Orientation,
        _page_size: u32,
    ) -> ProviderResult<Vec<VideoCandidate>> {
        let id = query.replace(' ', "-");
        Ok(vec![VideoCandidate {
            id: id.clone(),
            duration_seconds: 6.0,
            files: vec![VideoFile {
                link: format!("stock://{id}"),
                file_type: "video/mp4".to_string(),
                width: Some(1920),
                height: Some(1080),
            }],
            preview_image_url: None,
        }])
    }

    async fn popular(&self, _page_size: u32) -> ProviderResult<Vec<VideoCandidate>> {
        Ok(Vec::new())
    }
}

/// Generates an image URL from the prompt's leading phrase.
pub struct PromptImages;

#[async_trait]
impl ImageGenerator for PromptImages {
    async fn generate(&self, prompt: &str, _size: ImageSize) -> ProviderResult<GeneratedImage> {
        let subject = prompt.split(',').next().unwrap_or_default().trim();
        Ok(GeneratedImage {
            url: format!("image://{}", subject.replace(' ', "-")),
        })
    }
}

/// Sink that stores every snapshot.
pub fn recording_sink() -> (ProgressSink, Arc<Mutex<Vec<AssemblyProgress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let sink: ProgressSink = Arc::new(move |p: AssemblyProgress| {
        sink_seen.lock().unwrap().push(p);
    });
    (sink, seen)
}
