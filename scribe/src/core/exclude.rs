//! Path exclusion matching for the diff provider.

/// Names excluded from diffs unless configured otherwise: build output and lockfile.
pub const DEFAULT_EXCLUDES: &[&str] = &["dist", "bun.lock"];

/// True if `path` (git-style, `/`-separated) is covered by an excluded name.
///
/// A name matches the whole path or any single component, so `dist` covers
/// `dist/bundle.js` and `web/dist/app.js` but not `distance.rs`.
pub fn is_excluded<S: AsRef<str>>(path: &str, excludes: &[S]) -> bool {
    excludes.iter().any(|name| {
        let name = name.as_ref().trim_matches('/');
        !name.is_empty() && (path == name || path.split('/').any(|part| part == name))
    })
}
