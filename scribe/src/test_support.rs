//! Test-only helpers: throwaway git repositories and a scripted provider.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::core::types::{ChatMessage, ToolCall};
use crate::error::ProviderError;
use crate::io::provider::{ChatProvider, ModelTurn, TextSink, TurnRequest};

/// A git repository in a temporary directory, removed on drop.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// `git init` with a local identity so commits work on bare CI hosts.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        let repo = Self { dir };
        repo.git(&["init", "--quiet"])?;
        repo.git(&["config", "user.name", "scribe-tests"])?;
        repo.git(&["config", "user.email", "scribe-tests@example.com"])?;
        repo.git(&["config", "commit.gpgsign", "false"])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("mkdir {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn stage(&self, paths: &[&str]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.git(&args)
    }

    /// Stage everything and commit it.
    pub fn commit_all(&self, message: &str) -> Result<()> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "--quiet", "-m", message])
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(())
    }
}

/// One canned provider turn.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Stream `chunks` in order, then request `tool_calls` (if any).
    Reply {
        chunks: Vec<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// Stream `chunks`, then fail with a stream error carrying `message`.
    Fail {
        chunks: Vec<String>,
        message: String,
    },
}

impl ScriptedTurn {
    /// Plain text turn with no tool calls.
    pub fn text(chunks: &[&str]) -> Self {
        ScriptedTurn::Reply {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            tool_calls: Vec::new(),
        }
    }

    /// Turn requesting a single tool call with raw JSON `arguments`.
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        ScriptedTurn::Reply {
            chunks: Vec::new(),
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }

    pub fn fail(chunks: &[&str], message: &str) -> Self {
        ScriptedTurn::Fail {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            message: message.to_string(),
        }
    }
}

/// A recorded provider request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
}

/// Provider that replays scripted turns and records every request.
///
/// Running out of turns is a stream error so tests fail loudly.
pub struct ScriptedProvider {
    turns: RefCell<VecDeque<ScriptedTurn>>,
    requests: RefCell<Vec<RecordedRequest>>,
    calls: Cell<usize>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: RefCell::new(turns.into()),
            requests: RefCell::new(Vec::new()),
            calls: Cell::new(0),
        }
    }

    /// Number of `stream_turn` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }
}

impl ChatProvider for ScriptedProvider {
    fn stream_turn(
        &self,
        request: &TurnRequest<'_>,
        on_text: &mut TextSink<'_>,
    ) -> Result<ModelTurn, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(RecordedRequest {
            model: request.model.to_string(),
            messages: request.messages.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
        });

        let turn = self
            .turns
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ProviderError::Stream("script exhausted".to_string()))?;
        match turn {
            ScriptedTurn::Reply { chunks, tool_calls } => {
                let mut text = String::new();
                for chunk in &chunks {
                    on_text(chunk)?;
                    text.push_str(chunk);
                }
                let finish_reason = if tool_calls.is_empty() {
                    "stop"
                } else {
                    "tool_calls"
                };
                Ok(ModelTurn {
                    text,
                    tool_calls,
                    finish_reason: Some(finish_reason.to_string()),
                })
            }
            ScriptedTurn::Fail { chunks, message } => {
                for chunk in &chunks {
                    on_text(chunk)?;
                }
                Err(ProviderError::Stream(message))
            }
        }
    }
}
