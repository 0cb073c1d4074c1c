//! Diff provider: per-file unified diffs for a scope, minus excluded paths.

use std::path::Path;

use tracing::{debug, instrument};

use crate::core::exclude::is_excluded;
use crate::core::types::{DiffScope, FileDiff};
use crate::error::VcsError;
use crate::io::git::{Git, GitLimits};

/// Collect a [`FileDiff`] for every changed file in `scope` under `root`.
///
/// Files covered by `excludes` are skipped before their diff is requested.
#[instrument(skip_all, fields(root = %root.display(), ?scope))]
pub fn get_diffs<S: AsRef<str>>(
    root: &Path,
    scope: DiffScope,
    excludes: &[S],
    limits: GitLimits,
) -> Result<Vec<FileDiff>, VcsError> {
    let git = Git::new(root, limits);
    git.ensure_work_tree()?;

    let summary = git.diff_numstat(scope)?;
    let mut diffs = Vec::with_capacity(summary.len());
    for entry in summary {
        if is_excluded(&entry.file, excludes) {
            debug!(file = %entry.file, "skipping excluded file");
            continue;
        }
        debug!(
            file = %entry.file,
            insertions = entry.insertions,
            deletions = entry.deletions,
            binary = entry.binary,
            "collecting diff"
        );
        let diff = git.diff_file(scope, &entry.file)?;
        diffs.push(FileDiff {
            file: entry.file,
            diff,
        });
    }
    Ok(diffs)
}
