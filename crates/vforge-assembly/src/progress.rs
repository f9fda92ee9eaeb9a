//! Progress reporting for assembly runs.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;
use vforge_models::{AssemblyProgress, AssemblyStage};

/// Observer invoked once per stage transition.
pub type ProgressSink = Arc<dyn Fn(AssemblyProgress) + Send + Sync>;

pub const INIT_PERCENT: u8 = 0;
pub const RESOLVE_PERCENT: u8 = 5;
pub const RENDER_START_PERCENT: u8 = 10;
pub const RENDER_SPAN_PERCENT: u8 = 60;
pub const MERGE_PERCENT: u8 = 70;
pub const AUDIO_PERCENT: u8 = 85;
pub const EXPORT_PERCENT: u8 = 95;
pub const DONE_PERCENT: u8 = 100;

/// Percent reported before rendering scene `index` of `total`.
pub fn scene_progress(index: usize, total: usize) -> u8 {
    if total == 0 {
        return RENDER_START_PERCENT;
    }
    let index = index.min(total);
    let span = RENDER_SPAN_PERCENT as usize * index / total;
    RENDER_START_PERCENT + span as u8
}

/// Forward snapshots into a channel, dropping them when it is full.
pub fn channel_sink(tx: mpsc::Sender<AssemblyProgress>) -> ProgressSink {
    Arc::new(move |progress| {
        if let Err(e) = tx.try_send(progress) {
            debug!(error = %e, "Dropped progress update");
        }
    })
}

/// Reports snapshots to an optional sink, never letting the percentage go
/// backwards within a run.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
    last: u8,
}

impl ProgressReporter {
    pub fn new(sink: Option<ProgressSink>) -> Self {
        Self { sink, last: 0 }
    }

    pub fn report(&mut self, stage: AssemblyStage, progress: u8, message: impl Into<String>) {
        let progress = progress.max(self.last).min(DONE_PERCENT);
        self.last = progress;

        let snapshot = AssemblyProgress::new(stage, progress, message);
        debug!(stage = %snapshot.stage, progress = snapshot.progress, "{}", snapshot.message);
        if let Some(sink) = &self.sink {
            sink(snapshot);
        }
    }

    pub fn last(&self) -> u8 {
        self.last
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_sink", &self.sink.is_some())
            .field("last", &self.last)
            .finish()
    }
}
