//! Side-effecting adapters: git, file system, configuration, and the model
//! provider.

pub mod config;
pub mod diff;
pub mod git;
pub mod process;
pub mod prompt;
pub mod provider;
pub mod sampler;
pub mod writer;
