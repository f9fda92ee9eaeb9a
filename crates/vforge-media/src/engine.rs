//! Media engine abstraction.
//!
//! An engine owns a private file namespace and executes FFmpeg commands
//! against it. All file names passed to an engine are plain names inside
//! that namespace, never paths.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe;

/// Sequential media engine with its own file namespace.
///
/// Every method takes `&mut self`; one engine serves one run at a time.
#[async_trait]
pub trait MediaEngine: Send {
    /// Store `bytes` under `name`, replacing any previous file.
    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> MediaResult<()>;

    /// Read the full contents of `name`.
    async fn read_file(&mut self, name: &str) -> MediaResult<Vec<u8>>;

    /// Remove `name` from the namespace.
    async fn delete_file(&mut self, name: &str) -> MediaResult<()>;

    /// Execute a command whose relative paths resolve inside the namespace.
    async fn exec(&mut self, command: &FfmpegCommand) -> MediaResult<()>;

    /// Duration in seconds of a media file in the namespace.
    async fn probe_duration(&mut self, name: &str) -> MediaResult<f64>;
}

/// Reject names that would escape the namespace.
pub fn validate_file_name(name: &str) -> MediaResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(MediaError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// FFmpeg CLI engine backed by a temporary working directory.
///
/// The directory and everything in it is removed when the engine is dropped.
#[derive(Debug)]
pub struct FfmpegEngine {
    workspace: TempDir,
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    /// Create an engine with a workspace under the system temp directory.
    pub fn new() -> MediaResult<Self> {
        check_ffmpeg()?;
        let workspace = tempfile::Builder::new().prefix("vforge-").tempdir()?;
        Ok(Self::with_workspace(workspace))
    }

    /// Create an engine with a workspace under `base_dir`.
    pub fn in_dir(base_dir: impl AsRef<Path>) -> MediaResult<Self> {
        check_ffmpeg()?;
        std::fs::create_dir_all(base_dir.as_ref())?;
        let workspace = tempfile::Builder::new()
            .prefix("vforge-")
            .tempdir_in(base_dir)?;
        Ok(Self::with_workspace(workspace))
    }

    fn with_workspace(workspace: TempDir) -> Self {
        debug!(workspace = %workspace.path().display(), "Created media engine workspace");
        Self {
            workspace,
            runner: FfmpegRunner::new(),
        }
    }

    /// Kill running commands when the signal flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.runner = self.runner.with_cancel(cancel_rx);
        self
    }

    /// Bound every command to `secs` seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Names of all files currently in the workspace, sorted.
    pub fn list_files(&self) -> MediaResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.workspace.path())? {
            names.push(entry?.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        validate_file_name(name)?;
        Ok(self.workspace.path().join(name))
    }
}

fn not_found_as(name: &str, err: std::io::Error) -> MediaError {
    if err.kind() == std::io::ErrorKind::NotFound {
        MediaError::FileNotFound(name.to_string())
    } else {
        MediaError::Io(err)
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn write_file(&mut self, name: &str, bytes: &[u8]) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, bytes).await?;
        trace!(file = name, bytes = bytes.len(), "Wrote workspace file");
        Ok(())
    }

    async fn read_file(&mut self, name: &str) -> MediaResult<Vec<u8>> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path).await.map_err(|e| not_found_as(name, e))
    }

    async fn delete_file(&mut self, name: &str) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_as(name, e))
    }

    async fn exec(&mut self, command: &FfmpegCommand) -> MediaResult<()> {
        let command = command.clone().current_dir(self.workspace.path());
        let output = command.output().display().to_string();

        let start = Instant::now();
        let result = self
            .runner
            .run_with_progress(&command, |progress| {
                trace!(
                    out_time_secs = progress.out_time_secs(),
                    frame = progress.frame,
                    speed = progress.speed,
                    "FFmpeg progress"
                );
            })
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        metrics::histogram!("vforge_ffmpeg_exec_seconds").record(elapsed);
        debug!(output = %output, elapsed_secs = elapsed, ok = result.is_ok(), "FFmpeg command finished");

        result
    }

    async fn probe_duration(&mut self, name: &str) -> MediaResult<f64> {
        let path = self.resolve(name)?;
        if !path.exists() {
            return Err(MediaError::FileNotFound(name.to_string()));
        }
        probe::probe_duration(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("scene_0.mp4").is_ok());
        assert!(validate_file_name("concat_list.txt").is_ok());

        for bad in ["", ".", "..", "../etc/passwd", "a/b.mp4", "c:\\x.mp4"] {
            assert!(
                matches!(validate_file_name(bad), Err(MediaError::InvalidFileName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    #[ignore = "requires ffmpeg"]
    async fn test_workspace_file_lifecycle() {
        let base = tempfile::tempdir().unwrap();
        let mut engine = FfmpegEngine::in_dir(base.path()).unwrap();
        let workspace = engine.workspace_path().to_path_buf();

        engine.write_file("a.txt", b"hello").await.unwrap();
        assert_eq!(engine.read_file("a.txt").await.unwrap(), b"hello");
        assert_eq!(engine.list_files().unwrap(), vec!["a.txt"]);

        engine.delete_file("a.txt").await.unwrap();
        assert!(matches!(
            engine.read_file("a.txt").await,
            Err(MediaError::FileNotFound(_))
        ));

        drop(engine);
        assert!(!workspace.exists());
    }
}
