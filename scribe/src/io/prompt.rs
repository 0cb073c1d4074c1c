//! System prompts and task prompt rendering.

use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::types::FileDiff;

pub const REVIEW_SYSTEM_PROMPT: &str = include_str!("prompts/review_system.md");
pub const COMMIT_SYSTEM_PROMPT: &str = include_str!("prompts/commit_system.md");
pub const README_SYSTEM_PROMPT: &str = include_str!("prompts/readme_system.md");

const REVIEW_TASK_TEMPLATE: &str = include_str!("prompts/review_task.md");
const README_TASK_TEMPLATE: &str = include_str!("prompts/readme_task.md");

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("review", REVIEW_TASK_TEMPLATE)
            .context("load review template")?;
        env.add_template("readme", README_TASK_TEMPLATE)
            .context("load readme template")?;
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render {name} prompt"))
    }
}

/// User prompt asking for a file-by-file review of `target_dir`.
pub fn review_prompt(target_dir: &Path) -> Result<String> {
    PromptEngine::new()?.render(
        "review",
        context! { target_dir => target_dir.display().to_string() },
    )
}

/// User prompt asking for a README written into `root_dir`.
pub fn readme_prompt(root_dir: &Path, overwrite: bool) -> Result<String> {
    PromptEngine::new()?.render(
        "readme",
        context! {
            root_dir => root_dir.display().to_string(),
            overwrite => overwrite,
        },
    )
}

/// `Staged diffs:` header followed by one `# file:` block per diff.
pub fn commit_prompt(diffs: &[FileDiff]) -> String {
    let blocks: Vec<String> = diffs
        .iter()
        .map(|d| format!("# file: {}\n{}", d.file, d.diff))
        .collect();
    format!("Staged diffs:\n\n{}", blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_prompt_names_target_directory() {
        let prompt = review_prompt(Path::new("../my-agent")).expect("render");
        assert!(prompt.contains("'../my-agent'"));
        assert!(prompt.contains("file by file"));
    }

    #[test]
    fn readme_prompt_carries_overwrite_flag() {
        let prompt = readme_prompt(Path::new("/work/repo"), false).expect("render");
        assert!(prompt.contains(r#"rootDir "/work/repo""#));
        assert!(prompt.contains(r#"relativePath "README.md""#));
        assert!(prompt.contains("overwrite false"));
    }

    #[test]
    fn commit_prompt_joins_file_blocks() {
        let diffs = vec![
            FileDiff {
                file: "a.ts".to_string(),
                diff: "+a".to_string(),
            },
            FileDiff {
                file: "b.ts".to_string(),
                diff: "-b".to_string(),
            },
        ];
        assert_eq!(
            commit_prompt(&diffs),
            "Staged diffs:\n\n# file: a.ts\n+a\n\n# file: b.ts\n-b"
        );
    }

    #[test]
    fn commit_system_prompt_states_the_sentinel() {
        assert!(COMMIT_SYSTEM_PROMPT.contains(
            "No staged changes to commit. Stage files first (e.g., git add -p)."
        ));
    }
}
