//! Timeline compositing: ordered segments into one silent track.

use tracing::{debug, warn};

use crate::command::FfmpegCommand;
use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};

/// Workspace name of the concat demuxer list.
pub const CONCAT_LIST_NAME: &str = "concat_list.txt";
/// Workspace name of the concatenated silent track.
pub const CONCAT_OUTPUT_NAME: &str = "concatenated.mp4";

/// Build a concat demuxer list in the given order.
pub fn concat_list<S: AsRef<str>>(segment_names: &[S]) -> String {
    segment_names
        .iter()
        .map(|name| format!("file '{}'\n", name.as_ref().replace('\'', "'\\''")))
        .collect()
}

/// Stream-copy concatenation of every file in `list`.
pub fn concat_command(list: &str, output: &str) -> FfmpegCommand {
    FfmpegCommand::new(list, output)
        .input_format("concat")
        .input_args(["-safe", "0"])
        .stream_copy()
}

/// Concatenate segments in order. Segment files and the list are removed on success.
///
/// Segments must share one encoding profile; streams are copied, not re-encoded.
pub async fn concatenate<E, S>(engine: &mut E, segment_names: &[S]) -> MediaResult<String>
where
    E: MediaEngine + ?Sized,
    S: AsRef<str> + Sync,
{
    if segment_names.is_empty() {
        return Err(MediaError::invalid_video("No segments to concatenate"));
    }

    let list = concat_list(segment_names);
    engine.write_file(CONCAT_LIST_NAME, list.as_bytes()).await?;

    debug!(segments = segment_names.len(), "Concatenating segments");
    engine
        .exec(&concat_command(CONCAT_LIST_NAME, CONCAT_OUTPUT_NAME))
        .await?;

    for name in segment_names {
        if let Err(e) = engine.delete_file(name.as_ref()).await {
            warn!("Failed to delete segment {}: {}", name.as_ref(), e);
        }
    }
    if let Err(e) = engine.delete_file(CONCAT_LIST_NAME).await {
        warn!("Failed to delete concat list: {}", e);
    }

    Ok(CONCAT_OUTPUT_NAME.to_string())
}
