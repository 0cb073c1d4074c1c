//! Lexical path helpers for sandboxed writes.
//!
//! Nothing here touches the file system: `..` is resolved against the path
//! text itself, so escape checks can run before any directory is created.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`: drop `.` components and fold `..` into its parent.
///
/// `..` at the root of an absolute path stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Path of `target` relative to `root`, or `None` if it does not sit strictly below it.
///
/// Both paths must already be absolute and normalized. The root itself is not
/// a valid target.
pub fn relative_inside(root: &Path, target: &Path) -> Option<PathBuf> {
    let rel = target.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() || rel.is_absolute() {
        return None;
    }
    if rel
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_) | Component::RootDir))
    {
        return None;
    }
    Some(rel.to_path_buf())
}
