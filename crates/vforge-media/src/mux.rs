//! Audio muxing: silent video track plus voiceover.

use tracing::{debug, warn};
use vforge_models::EncodingConfig;

use crate::command::FfmpegCommand;
use crate::engine::MediaEngine;
use crate::error::MediaResult;

/// Workspace name of the muxed output.
pub const MUX_OUTPUT_NAME: &str = "final.mp4";

/// Workspace name for the narration track with a sanitized extension.
pub fn audio_file_name(audio_ext: &str) -> String {
    let ext: String = audio_ext
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        "narration.mp3".to_string()
    } else {
        format!("narration.{}", ext)
    }
}

/// Copy the video stream, re-encode audio, stop at the shorter input.
pub fn mux_command(video: &str, audio: &str, output: &str, encoding: &EncodingConfig) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .add_input(audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_codec("copy")
        .output_args(encoding.to_audio_args())
        .shortest()
}

/// Mux `audio_bytes` onto a silent video. Both inputs are removed on success.
pub async fn mux_audio<E>(
    engine: &mut E,
    silent_video_name: &str,
    audio_bytes: &[u8],
    audio_ext: &str,
    encoding: &EncodingConfig,
) -> MediaResult<String>
where
    E: MediaEngine + ?Sized,
{
    let audio_name = audio_file_name(audio_ext);
    engine.write_file(&audio_name, audio_bytes).await?;

    debug!(video = silent_video_name, audio = %audio_name, "Muxing narration");
    engine
        .exec(&mux_command(silent_video_name, &audio_name, MUX_OUTPUT_NAME, encoding))
        .await?;

    for name in [silent_video_name, audio_name.as_str()] {
        if let Err(e) = engine.delete_file(name).await {
            warn!("Failed to delete mux input {}: {}", name, e);
        }
    }

    Ok(MUX_OUTPUT_NAME.to_string())
}
