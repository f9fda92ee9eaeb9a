//! Scene rendering: one resolved asset in, one normalized segment out.

use tracing::{debug, warn};
use vforge_models::{loop_plan, round_duration, ClipAsset, EncodingConfig, MotionEffect, ResolvedAsset};

use crate::command::FfmpegCommand;
use crate::engine::MediaEngine;
use crate::error::MediaResult;
use crate::filters;

/// Source material for one segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentInput<'a> {
    pub asset: &'a ResolvedAsset,
    /// Downloaded bytes of `asset.source_uri()`
    pub bytes: &'a [u8],
}

/// Workspace name of the normalized segment for a zero-based scene index.
pub fn segment_name(scene_index: usize) -> String {
    format!("scene_{}.mp4", scene_index)
}

/// Guess an image file extension from its magic bytes.
///
/// FFmpeg's image demuxer picks the decoder from the extension.
pub fn image_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        "jpg"
    }
}

/// Looping needed for `clip` to fill a `seconds`-long segment.
///
/// Re-planned from the source duration when it is known, since the asset may
/// have been fitted to an unrounded scene duration.
pub fn clip_loop_plan(clip: &ClipAsset, seconds: u32) -> (bool, u32) {
    if clip.source_duration_seconds > 0.0 {
        loop_plan(clip.source_duration_seconds, seconds as f64)
    } else {
        (clip.needs_looping, clip.loop_count)
    }
}

/// Command looping/trimming a clip to exactly `seconds`.
///
/// Source audio is dropped; the voiceover is the only audio track.
pub fn clip_command(
    input: &str,
    output: &str,
    needs_looping: bool,
    loop_count: u32,
    seconds: u32,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, output);
    if needs_looping && loop_count > 1 {
        cmd = cmd.stream_loop(loop_count - 1);
    }

    cmd.output_duration(seconds)
        .video_filter(filters::clip_filter(encoding))
        .output_args(encoding.to_video_args())
        .no_audio()
}

/// Command animating a still image for exactly `seconds`.
pub fn image_command(
    input: &str,
    output: &str,
    effect: MotionEffect,
    seconds: u32,
    encoding: &EncodingConfig,
) -> FfmpegCommand {
    let frames = encoding.frames_for(seconds);

    FfmpegCommand::new(input, output)
        .loop_image()
        .output_duration(seconds)
        .video_filter(filters::motion_filter(effect, frames, encoding))
        .output_args(encoding.to_video_args())
        .no_audio()
}

/// Render one scene into a normalized segment inside the engine workspace.
///
/// Returns the segment's workspace name. The input file is removed whether
/// or not the render succeeds.
pub async fn render_segment<E>(
    engine: &mut E,
    input: SegmentInput<'_>,
    target_seconds: f64,
    scene_index: usize,
    encoding: &EncodingConfig,
) -> MediaResult<String>
where
    E: MediaEngine + ?Sized,
{
    let seconds = round_duration(target_seconds);
    let output = segment_name(scene_index);

    let (input_name, cmd) = match input.asset {
        ResolvedAsset::Clip(clip) => {
            let name = format!("scene_{}_input.mp4", scene_index);
            let (needs_looping, loop_count) = clip_loop_plan(clip, seconds);
            let cmd = clip_command(&name, &output, needs_looping, loop_count, seconds, encoding);
            (name, cmd)
        }
        ResolvedAsset::Image(image) => {
            let name = format!("scene_{}_input.{}", scene_index, image_extension(input.bytes));
            let cmd = image_command(&name, &output, image.motion_effect, seconds, encoding);
            (name, cmd)
        }
    };

    debug!(
        scene_index,
        seconds,
        input = %input_name,
        bytes = input.bytes.len(),
        "Rendering segment"
    );

    engine.write_file(&input_name, input.bytes).await?;
    let result = engine.exec(&cmd).await;

    if let Err(e) = engine.delete_file(&input_name).await {
        warn!(scene_index, "Failed to delete segment input {}: {}", input_name, e);
    }

    result.map(|_| output)
}
