//! Git adapter for diff gathering.
//!
//! scribe only ever reads from the repository, so the wrapper stays small:
//! work-tree detection, `--numstat` summaries, and per-file unified diffs, all
//! run through [`run_bounded`] so a wedged git cannot hang a task.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::types::{DiffScope, DiffSummaryEntry};
use crate::error::VcsError;
use crate::io::process::{CommandOutput, run_bounded};

/// Limits applied to every git invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitLimits {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl Default for GitLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            output_limit_bytes: 1_000_000,
        }
    }
}

/// Wrapper for executing read-only git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    limits: GitLimits,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, limits: GitLimits) -> Self {
        Self {
            workdir: workdir.into(),
            limits,
        }
    }

    /// Error unless the workdir sits inside a git working tree.
    #[instrument(skip_all, fields(workdir = %self.workdir.display()))]
    pub fn ensure_work_tree(&self) -> Result<(), VcsError> {
        let not_a_tree = || VcsError::NotAWorkTree {
            root: self.workdir.clone(),
        };
        if !self.workdir.is_dir() {
            return Err(not_a_tree());
        }
        let output = self.run(&["rev-parse", "--is-inside-work-tree"])?;
        if !output.status.success() || output.stdout_text().trim() != "true" {
            debug!(stderr = %output.stderr_text(), "not inside a work tree");
            return Err(not_a_tree());
        }
        Ok(())
    }

    /// Per-file change counts for `scope`, in git's own ordering.
    ///
    /// Renames are reported as a delete plus an add so every entry is a
    /// plain path usable with `git diff -- <path>`. Paths are relative to the
    /// workdir and limited to it when the workdir is a subdirectory. Records
    /// are NUL-terminated (`-z`) so paths arrive unquoted.
    pub fn diff_numstat(&self, scope: DiffScope) -> Result<Vec<DiffSummaryEntry>, VcsError> {
        let mut args = vec![
            "diff",
            "--numstat",
            "-z",
            "--no-renames",
            "--no-color",
            "--relative",
        ];
        args.extend_from_slice(scope.git_args());
        let output = self.run_checked(&args)?;
        if output.stdout_truncated > 0 {
            return Err(command_error(
                &args,
                format!(
                    "summary exceeded {} bytes ({} bytes dropped); raise git.output_limit_bytes",
                    self.limits.output_limit_bytes, output.stdout_truncated
                ),
            ));
        }
        parse_numstat(&output.stdout_text())
    }

    /// Unified diff text for a single file in `scope`.
    ///
    /// Output past the byte limit is dropped and a truncation marker is
    /// appended.
    pub fn diff_file(&self, scope: DiffScope, file: &str) -> Result<String, VcsError> {
        let mut args = vec!["diff", "--no-color", "--relative"];
        args.extend_from_slice(scope.git_args());
        args.extend_from_slice(&["--", file]);
        let output = self.run_checked(&args)?;
        if output.stdout_truncated > 0 {
            warn!(file, dropped = output.stdout_truncated, "diff truncated");
        }
        let mut text = output.stdout_text();
        text.push_str(&output.stdout_truncated_notice("git diff"));
        Ok(text)
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandOutput, VcsError> {
        let output = self.run(args)?;
        if output.timed_out {
            return Err(command_error(
                args,
                format!("timed out after {:?}", self.limits.timeout),
            ));
        }
        if !output.status.success() {
            return Err(command_error(args, output.stderr_text()));
        }
        Ok(output)
    }

    /// Pathspecs are taken literally and paths in diff headers are left
    /// unescaped.
    fn run(&self, args: &[&str]) -> Result<CommandOutput, VcsError> {
        let mut cmd = Command::new("git");
        cmd.args(["-c", "core.quotePath=false"])
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_PAGER", "cat")
            .env("GIT_LITERAL_PATHSPECS", "1")
            .env("LC_ALL", "C");
        run_bounded(cmd, self.limits.timeout, self.limits.output_limit_bytes)
            .map_err(|err| command_error(args, format!("{err:#}")))
    }
}

fn command_error(args: &[&str], message: String) -> VcsError {
    VcsError::Command {
        args: args.join(" "),
        message,
    }
}

/// Parse NUL-terminated `--numstat -z` output.
fn parse_numstat(raw: &str) -> Result<Vec<DiffSummaryEntry>, VcsError> {
    raw.split('\0')
        .filter(|record| !record.trim().is_empty())
        .map(parse_numstat_line)
        .collect()
}

/// Parse `<added>\t<deleted>\t<path>`; binary files report `-` counts.
fn parse_numstat_line(line: &str) -> Result<DiffSummaryEntry, VcsError> {
    let malformed = || VcsError::Command {
        args: "diff --numstat".to_string(),
        message: format!("unexpected numstat line: '{line}'"),
    };
    let mut parts = line.splitn(3, '\t');
    let added = parts.next().ok_or_else(malformed)?;
    let deleted = parts.next().ok_or_else(malformed)?;
    let file = parts.next().ok_or_else(malformed)?;
    if file.is_empty() {
        return Err(malformed());
    }
    let binary = added == "-" && deleted == "-";
    let count = |raw: &str| -> Result<u64, VcsError> {
        if raw == "-" {
            return Ok(0);
        }
        raw.parse().map_err(|_| malformed())
    };
    Ok(DiffSummaryEntry {
        file: file.to_string(),
        insertions: count(added)?,
        deletions: count(deleted)?,
        binary,
    })
}
