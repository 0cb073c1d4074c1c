//! Shared deterministic types for scribe core logic.
//!
//! These types define stable contracts between the leaf components, the tool
//! registry, and the session orchestrator. They carry no I/O.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which version-control state a diff is taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
    /// All changes in the working tree, staged or not, relative to the index.
    WorkingTree,
    /// Changes indexed for the next commit.
    Staged,
}

impl DiffScope {
    /// Extra `git diff` flags selecting this scope.
    pub fn git_args(self) -> &'static [&'static str] {
        match self {
            DiffScope::WorkingTree => &[],
            DiffScope::Staged => &["--cached"],
        }
    }
}

/// Unified diff for a single changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub file: String,
    pub diff: String,
}

/// One `git diff --numstat` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSummaryEntry {
    pub file: String,
    pub insertions: u64,
    pub deletions: u64,
    /// Git reports `-` counts for binary files.
    pub binary: bool,
}

/// Truncated file contents used to ground README generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSample {
    pub path: String,
    pub snippet: String,
}

/// Result of a successful markdown write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub file_path: PathBuf,
    pub bytes_written: usize,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON text as produced by the model; validated by the registry.
    pub arguments: String,
}

/// One entry of the step transcript exchanged with the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

/// Session orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    AwaitingToolResult,
    Completed,
    StepLimitReached,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::StepLimitReached | SessionState::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_scope_adds_cached_flag() {
        assert_eq!(DiffScope::Staged.git_args(), &["--cached"]);
        assert!(DiffScope::WorkingTree.git_args().is_empty());
    }

    #[test]
    fn write_outcome_serializes_camel_case() {
        let outcome = WriteOutcome {
            file_path: PathBuf::from("/repo/README.md"),
            bytes_written: 3,
        };
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(value["filePath"], "/repo/README.md");
        assert_eq!(value["bytesWritten"], 3);
    }

    #[test]
    fn only_end_states_are_terminal() {
        assert!(!SessionState::Idle.is_terminal());
        assert!(!SessionState::AwaitingToolResult.is_terminal());
        assert!(SessionState::StepLimitReached.is_terminal());
    }
}
