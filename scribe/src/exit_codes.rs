//! Stable exit codes for scribe CLI commands.

/// Command succeeded, including the nothing-staged commit notice.
pub const OK: i32 = 0;
/// Invalid config, git failure, provider failure, or any other error.
pub const FAILED: i32 = 1;
