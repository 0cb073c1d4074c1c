//! Typed errors for the leaf components and the model provider.
//!
//! Orchestration code works in `anyhow::Result`; these types exist where a
//! caller has to branch on the failure kind. Tool errors are reported back to
//! the model, provider errors abort the session, and VCS errors abort a task
//! before generation when they happen outside a tool call.

use std::path::PathBuf;

use thiserror::Error;

/// The diff provider could not compute a diff.
#[derive(Debug, Error)]
pub enum VcsError {
    /// `root` is not inside a git working tree.
    #[error("not a git working tree: {}", root.display())]
    NotAWorkTree { root: PathBuf },

    /// A git invocation failed to spawn, timed out, or exited non-zero.
    #[error("git {args} failed: {message}")]
    Command { args: String, message: String },
}

/// Failure of a tool invocation. Always surfaced to the model as a tool result.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool input or target path failed schema/extension checks.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Write target resolves outside the sandboxed root.
    #[error("target path must be inside rootDir: {}", path.display())]
    PathEscape { path: PathBuf },

    /// `overwrite=false` and the target already exists.
    #[error("file already exists at {}. Set overwrite=true to replace.", path.display())]
    AlreadyExists { path: PathBuf },

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Stable short name reported to the model alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "validation",
            ToolError::PathEscape { .. } => "path_escape",
            ToolError::AlreadyExists { .. } => "already_exists",
            ToolError::Vcs(_) => "vcs",
            ToolError::Io(_) => "io",
        }
    }
}

/// The generation call failed at the transport or provider level.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("request to model provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider stream: {0}")]
    Stream(String),

    /// Writing streamed text to the output sink failed.
    #[error("write model output: {0}")]
    Output(#[from] std::io::Error),
}
