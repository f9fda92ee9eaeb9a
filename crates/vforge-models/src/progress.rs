//! Assembly progress snapshots.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage reported to progress observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyStage {
    Init,
    Download,
    Process,
    Merge,
    Audio,
    Export,
    Done,
}

impl AssemblyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyStage::Init => "init",
            AssemblyStage::Download => "download",
            AssemblyStage::Process => "process",
            AssemblyStage::Merge => "merge",
            AssemblyStage::Audio => "audio",
            AssemblyStage::Export => "export",
            AssemblyStage::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssemblyStage::Done)
    }
}

impl fmt::Display for AssemblyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable progress snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssemblyProgress {
    pub stage: AssemblyStage,
    /// Percent complete (0-100)
    pub progress: u8,
    pub message: String,
}

impl AssemblyProgress {
    pub fn new(stage: AssemblyStage, progress: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: progress.min(100),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_capped() {
        let p = AssemblyProgress::new(AssemblyStage::Done, 140, "done");
        assert_eq!(p.progress, 100);
        assert!(p.stage.is_terminal());
    }

    #[test]
    fn test_stage_serialization() {
        let p = AssemblyProgress::new(AssemblyStage::Merge, 70, "Merging scenes");
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"stage\":\"merge\""));
    }
}
