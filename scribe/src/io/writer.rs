//! Sandboxed markdown writer used by `generateMarkdownFileTool`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::core::path::{normalize_lexically, relative_inside};
use crate::core::types::WriteOutcome;
use crate::error::ToolError;

/// Extensions the writer accepts for its target.
pub const DOC_EXTENSIONS: &[&str] = &[".md", ".mdx"];

/// Write `content` to `relative_path` under `root`.
///
/// The target must carry a document extension and resolve strictly inside
/// `root`, both lexically and after following any existing symlinks. With
/// `overwrite == false` an existing file is left untouched.
#[instrument(skip(content), fields(root = %root.display(), bytes = content.len()))]
pub fn write_markdown(
    root: &Path,
    relative_path: &str,
    content: &str,
    overwrite: bool,
) -> Result<WriteOutcome, ToolError> {
    if !DOC_EXTENSIONS.iter().any(|ext| relative_path.ends_with(ext)) {
        return Err(ToolError::Validation(
            "target path must end with .md or .mdx".to_string(),
        ));
    }

    let abs_root = absolute(root)?;
    let target = normalize_lexically(&abs_root.join(relative_path));
    if relative_inside(&abs_root, &target).is_none() {
        return Err(ToolError::PathEscape { path: target });
    }
    ensure_no_symlink_escape(&abs_root, &target)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    if !overwrite && fs::symlink_metadata(&target).is_ok() {
        return Err(ToolError::AlreadyExists { path: target });
    }

    fs::write(&target, content)?;
    debug!(path = %target.display(), "wrote markdown file");
    Ok(WriteOutcome {
        file_path: target,
        bytes_written: content.len(),
    })
}

fn absolute(path: &Path) -> Result<PathBuf, ToolError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize_lexically(&joined))
}

/// Reject targets whose existing ancestors (or the target itself) resolve
/// outside the canonical root through a symlink.
///
/// Runs before any directory is created so a linked directory cannot be used
/// to plant files elsewhere.
fn ensure_no_symlink_escape(abs_root: &Path, target: &Path) -> Result<(), ToolError> {
    let Ok(canonical_root) = fs::canonicalize(abs_root) else {
        // Root does not exist yet; nothing below it can be a link.
        return Ok(());
    };

    let escape = || ToolError::PathEscape {
        path: target.to_path_buf(),
    };

    if fs::symlink_metadata(target).is_ok() {
        let resolved = fs::canonicalize(target).map_err(|_| escape())?;
        if !resolved.starts_with(&canonical_root) {
            return Err(escape());
        }
    }

    let mut ancestor = target.parent();
    while let Some(dir) = ancestor {
        if dir.exists() {
            let resolved = fs::canonicalize(dir)?;
            if !resolved.starts_with(&canonical_root) {
                return Err(escape());
            }
            break;
        }
        ancestor = dir.parent();
    }
    Ok(())
}
