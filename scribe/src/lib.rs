//! LLM-backed repository assistant: code review, commit messages, and READMEs.
//!
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (exclusion matching, path
//!   containment, shared types). No I/O.
//! - **[`io`]**: Side-effecting adapters (git, file system, config, the hosted
//!   model provider).
//! - **[`tools`]**: Schema-validated functions the model may call. The only
//!   code that touches git or the file system on the model's behalf.
//!
//! [`session`] drives the bounded generation loop; [`tasks`] wires prompts and
//! tool subsets for each CLI command.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
pub mod tasks;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
