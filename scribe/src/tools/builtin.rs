//! The three built-in tools wrapping the leaf components.
//!
//! Tool names are part of the prompt contract, so they stay fixed.

use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::core::types::DiffScope;
use crate::error::ToolError;
use crate::io::diff::get_diffs;
use crate::io::git::GitLimits;
use crate::io::sampler::{DEFAULT_MAX_BYTES_PER_FILE, DEFAULT_MAX_FILES, sample_project};
use crate::io::writer::write_markdown;

use super::{ToolRegistry, ToolSpec};

pub const DIFF_TOOL: &str = "getFileChangesInDirectoryTool";
pub const SAMPLER_TOOL: &str = "summarizeProjectTool";
pub const WRITER_TOOL: &str = "generateMarkdownFileTool";

/// Settings the built-in tools need from configuration.
#[derive(Debug, Clone)]
pub struct BuiltinSettings {
    pub exclude: Vec<String>,
    pub git_limits: GitLimits,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiffInput {
    root_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleInput {
    root_dir: PathBuf,
    #[serde(default = "default_max_files")]
    max_files: usize,
    #[serde(default = "default_max_bytes")]
    max_bytes_per_file: usize,
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES_PER_FILE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteInput {
    root_dir: PathBuf,
    relative_path: String,
    content: String,
    /// Only an explicit `false` refuses to replace an existing file.
    #[serde(default)]
    overwrite: Option<bool>,
}

fn parse_input<T: DeserializeOwned>(input: &Value) -> Result<T, ToolError> {
    serde_json::from_value(input.clone()).map_err(|err| ToolError::Validation(err.to_string()))
}

fn to_result_value<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value)
        .map_err(|err| ToolError::Io(std::io::Error::other(format!("serialize result: {err}"))))
}

/// Tool listing working-tree changes under `rootDir`.
pub fn diff_tool(settings: &BuiltinSettings) -> Result<ToolSpec> {
    let exclude = settings.exclude.clone();
    let limits = settings.git_limits;
    ToolSpec::new(
        DIFF_TOOL,
        "Gets the code changes made in given directory",
        json!({
            "type": "object",
            "properties": {
                "rootDir": { "type": "string", "minLength": 1, "description": "The root directory" }
            },
            "required": ["rootDir"]
        }),
        move |input| {
            let input: DiffInput = parse_input(input)?;
            let diffs = get_diffs(&input.root_dir, DiffScope::WorkingTree, exclude.as_slice(), limits)?;
            to_result_value(&diffs)
        },
    )
}

/// Tool returning truncated snippets of key repository files.
pub fn sampler_tool() -> Result<ToolSpec> {
    ToolSpec::new(
        SAMPLER_TOOL,
        "Reads key files in the repository root to provide grounded context for docs",
        json!({
            "type": "object",
            "properties": {
                "rootDir": {
                    "type": "string",
                    "minLength": 1,
                    "description": "The repository root to summarize"
                },
                "maxFiles": { "type": "integer", "exclusiveMinimum": 0, "maximum": 50 },
                "maxBytesPerFile": { "type": "integer", "exclusiveMinimum": 0, "maximum": 100000 }
            },
            "required": ["rootDir"]
        }),
        |input| {
            let input: SampleInput = parse_input(input)?;
            let samples =
                sample_project(&input.root_dir, input.max_files, input.max_bytes_per_file)
                    .map_err(|err| ToolError::Io(std::io::Error::other(format!("{err:#}"))))?;
            to_result_value(&samples)
        },
    )
}

/// Tool writing a markdown file inside `rootDir`.
pub fn writer_tool() -> Result<ToolSpec> {
    ToolSpec::new(
        WRITER_TOOL,
        "Creates or overwrites a Markdown file inside rootDir at relativePath",
        json!({
            "type": "object",
            "properties": {
                "rootDir": {
                    "type": "string",
                    "minLength": 1,
                    "description": "The root directory in which to write"
                },
                "relativePath": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Relative path to markdown file, e.g., docs/notes.md"
                },
                "content": { "type": "string", "description": "Markdown content to write" },
                "overwrite": {
                    "type": "boolean",
                    "description": "If false, error when file exists. Default true."
                }
            },
            "required": ["rootDir", "relativePath", "content"]
        }),
        |input| {
            let input: WriteInput = parse_input(input)?;
            let outcome = write_markdown(
                &input.root_dir,
                &input.relative_path,
                &input.content,
                input.overwrite.unwrap_or(true),
            )?;
            to_result_value(&outcome)
        },
    )
}

/// Registry holding all three built-in tools.
pub fn builtin_registry(settings: &BuiltinSettings) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(diff_tool(settings)?)?;
    registry.register(sampler_tool()?)?;
    registry.register(writer_tool()?)?;
    Ok(registry)
}
