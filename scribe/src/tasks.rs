//! The review, commit-message, and readme entry points.
//!
//! Each task builds its prompt and tool subset, then hands off to
//! [`run_session`]. Streamed text goes to the caller's sink.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::types::DiffScope;
use crate::io::config::ScribeConfig;
use crate::io::diff::get_diffs;
use crate::io::prompt::{
    COMMIT_SYSTEM_PROMPT, README_SYSTEM_PROMPT, REVIEW_SYSTEM_PROMPT, commit_prompt,
    readme_prompt, review_prompt,
};
use crate::io::provider::ChatProvider;
use crate::session::{SessionConfig, SessionOutcome, run_session};
use crate::tools::ToolRegistry;
use crate::tools::builtin::{BuiltinSettings, DIFF_TOOL, builtin_registry};

/// Written instead of calling the model when nothing is staged.
pub const NO_STAGED_CHANGES: &str =
    "No staged changes to commit. Stage files first (e.g., git add -p).";

/// Settings shared by all tasks.
#[derive(Debug, Clone)]
pub struct TaskSettings {
    pub model: String,
    pub max_steps: u32,
    pub tools: BuiltinSettings,
}

impl TaskSettings {
    pub fn from_config(cfg: &ScribeConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            max_steps: cfg.max_steps,
            tools: BuiltinSettings {
                exclude: cfg.exclude.clone(),
                git_limits: cfg.git_limits(),
            },
        }
    }

    fn session(&self, system_prompt: &str, prompt: String, tools: ToolRegistry) -> SessionConfig {
        SessionConfig {
            model: self.model.clone(),
            system_prompt: system_prompt.to_string(),
            prompt,
            tools,
            max_steps: self.max_steps,
        }
    }
}

/// Review the working-tree changes under `target_dir`, file by file.
#[instrument(skip_all, fields(target_dir = %target_dir.display()))]
pub fn run_review<P: ChatProvider + ?Sized>(
    provider: &P,
    settings: &TaskSettings,
    target_dir: &Path,
    sink: &mut dyn Write,
) -> Result<SessionOutcome> {
    let tools = builtin_registry(&settings.tools)?.subset(&[DIFF_TOOL])?;
    let prompt = review_prompt(target_dir)?;
    let outcome = run_session(
        provider,
        &settings.session(REVIEW_SYSTEM_PROMPT, prompt, tools),
        sink,
    )?;
    info!(state = ?outcome.state, steps = outcome.steps, "review finished");
    Ok(outcome)
}

/// Draft a Conventional Commit message from the staged diffs in `root_dir`.
///
/// Returns `None` without calling the provider when nothing is staged; the
/// fixed notice is written to `sink` instead.
#[instrument(skip_all, fields(root_dir = %root_dir.display()))]
pub fn run_commit_message<P: ChatProvider + ?Sized>(
    provider: &P,
    settings: &TaskSettings,
    root_dir: &Path,
    sink: &mut dyn Write,
) -> Result<Option<SessionOutcome>> {
    let diffs = get_diffs(
        root_dir,
        DiffScope::Staged,
        settings.tools.exclude.as_slice(),
        settings.tools.git_limits,
    )
    .context("collect staged diffs")?;

    if diffs.is_empty() {
        debug!("nothing staged");
        writeln!(sink, "{NO_STAGED_CHANGES}").context("write output")?;
        sink.flush().context("flush output")?;
        return Ok(None);
    }

    let files: Vec<&str> = diffs.iter().map(|d| d.file.as_str()).collect();
    debug!(?files, "staged files");
    let outcome = run_session(
        provider,
        &settings.session(
            COMMIT_SYSTEM_PROMPT,
            commit_prompt(&diffs),
            ToolRegistry::new(),
        ),
        sink,
    )?;
    finish_line(sink)?;
    Ok(Some(outcome))
}

/// Generate `README.md` in `root_dir` from a bounded sample of its files.
#[instrument(skip_all, fields(root_dir = %root_dir.display(), overwrite))]
pub fn run_readme<P: ChatProvider + ?Sized>(
    provider: &P,
    settings: &TaskSettings,
    root_dir: &Path,
    overwrite: bool,
    sink: &mut dyn Write,
) -> Result<SessionOutcome> {
    let tools = builtin_registry(&settings.tools)?;
    let prompt = readme_prompt(root_dir, overwrite)?;
    let outcome = run_session(
        provider,
        &settings.session(README_SYSTEM_PROMPT, prompt, tools),
        sink,
    )?;
    finish_line(sink)?;
    info!(state = ?outcome.state, tool_calls = outcome.tool_calls, "readme finished");
    Ok(outcome)
}

fn finish_line(sink: &mut dyn Write) -> Result<()> {
    sink.write_all(b"\n").context("write output")?;
    sink.flush().context("flush output")
}
