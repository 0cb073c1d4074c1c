//! End-to-end task scenarios driven by a scripted model.
//!
//! These run the real tools against real git repositories and temp
//! directories; only the model provider is replaced.

use std::fs;

use serde_json::{Value, json};

use scribe::core::types::{ChatMessage, SessionState, ToolCall};
use scribe::io::config::ScribeConfig;
use scribe::tasks::{TaskSettings, run_commit_message, run_readme, run_review};
use scribe::test_support::{ScriptedProvider, ScriptedTurn, TestRepo};
use scribe::tools::builtin::{DIFF_TOOL, SAMPLER_TOOL, WRITER_TOOL};

fn settings() -> TaskSettings {
    TaskSettings::from_config(&ScribeConfig::default())
}

fn call(id: &str, name: &str, arguments: Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn tool_results(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|message| match message {
            ChatMessage::Tool { content, .. } => {
                Some(serde_json::from_str(content).expect("tool result json"))
            }
            _ => None,
        })
        .collect()
}

/// Staged `a.ts` (+5/-1) and `dist/bundle.js`: only `a.ts` reaches the prompt.
#[test]
fn commit_prompt_leaves_out_build_output() {
    let repo = TestRepo::new().expect("repo");
    repo.write("a.ts", "const a = 1;\n").expect("write");
    repo.commit_all("init").expect("commit");

    repo.write(
        "a.ts",
        "const a = 2;\nconst b = 3;\nconst c = 4;\nconst d = 5;\nconst e = 6;\n",
    )
    .expect("write");
    repo.write("dist/bundle.js", "console.log('built');\n")
        .expect("write");
    repo.stage(&["a.ts", "dist/bundle.js"]).expect("stage");

    let provider = ScriptedProvider::new(vec![ScriptedTurn::text(&[
        "feat(a): ",
        "add b through e constants",
    ])]);
    let mut sink = Vec::new();
    run_commit_message(&provider, &settings(), repo.path(), &mut sink)
        .expect("commit")
        .expect("session ran");

    let requests = provider.requests();
    let ChatMessage::User(prompt) = &requests[0].messages[1] else {
        panic!("expected user prompt");
    };
    assert!(prompt.contains("# file: a.ts\n"));
    assert!(prompt.contains("+const e = 6;"));
    assert!(prompt.contains("-const a = 1;"));
    assert!(!prompt.contains("dist/bundle.js"));

    let message = String::from_utf8(sink).expect("utf8");
    assert!(message.starts_with("feat(a): "));
    assert!(message.ends_with('\n'));
}

/// Existing README and overwrite=false: the write fails as a tool result and
/// the text streamed before it survives.
#[test]
fn readme_without_overwrite_reports_tool_error_and_keeps_text() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    fs::write(root.join("README.md"), "# Original\n").expect("seed");
    fs::write(root.join("package.json"), r#"{"name":"demo"}"#).expect("seed");
    let root_dir = root.display().to_string();

    let provider = ScriptedProvider::new(vec![
        ScriptedTurn::Reply {
            chunks: vec!["Reading the project. ".to_string()],
            tool_calls: vec![call(
                "call_1",
                SAMPLER_TOOL,
                json!({ "rootDir": root_dir }),
            )],
        },
        ScriptedTurn::Reply {
            chunks: vec!["Writing README. ".to_string()],
            tool_calls: vec![call(
                "call_2",
                WRITER_TOOL,
                json!({
                    "rootDir": root_dir,
                    "relativePath": "README.md",
                    "content": "# demo\n",
                    "overwrite": false
                }),
            )],
        },
        ScriptedTurn::text(&["README.md already exists; left it unchanged."]),
    ]);
    let mut sink = Vec::new();
    let outcome = run_readme(&provider, &settings(), root, false, &mut sink).expect("readme");

    assert_eq!(outcome.state, SessionState::Completed);
    assert_eq!(outcome.tool_calls, 2);
    let output = String::from_utf8(sink).expect("utf8");
    assert!(output.starts_with("Reading the project. Writing README. "));
    assert_eq!(
        fs::read_to_string(root.join("README.md")).expect("read"),
        "# Original\n"
    );

    let requests = provider.requests();
    let results = tool_results(&requests[2].messages);
    assert_eq!(results[0][0]["path"], "package.json");
    assert_eq!(results[1]["error"]["kind"], "already_exists");
}

#[test]
fn readme_writes_file_inside_root() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let root_dir = root.display().to_string();
    let content = "# démo\n\nUsage: `demo run`\n";

    let provider = ScriptedProvider::new(vec![
        ScriptedTurn::Reply {
            chunks: Vec::new(),
            tool_calls: vec![call(
                "call_1",
                WRITER_TOOL,
                json!({ "rootDir": root_dir, "relativePath": "README.md", "content": content }),
            )],
        },
        ScriptedTurn::text(&["Wrote README.md."]),
    ]);
    let mut sink = Vec::new();
    run_readme(&provider, &settings(), root, true, &mut sink).expect("readme");

    assert_eq!(
        fs::read_to_string(root.join("README.md")).expect("read"),
        content
    );
    let requests = provider.requests();
    let results = tool_results(&requests[1].messages);
    assert_eq!(results[0]["bytesWritten"], content.len());
}

#[test]
fn readme_write_outside_root_is_refused() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().join("repo");
    fs::create_dir_all(&root).expect("mkdir");
    let root_dir = root.display().to_string();

    let provider = ScriptedProvider::new(vec![
        ScriptedTurn::Reply {
            chunks: Vec::new(),
            tool_calls: vec![call(
                "call_1",
                WRITER_TOOL,
                json!({ "rootDir": root_dir, "relativePath": "../escape.md", "content": "x" }),
            )],
        },
        ScriptedTurn::text(&["Refused."]),
    ]);
    let mut sink = Vec::new();
    run_readme(&provider, &settings(), &root, true, &mut sink).expect("readme");

    assert!(!temp.path().join("escape.md").exists());
    let requests = provider.requests();
    let results = tool_results(&requests[1].messages);
    assert_eq!(results[0]["error"]["kind"], "path_escape");
}

/// A model that requests the diff tool on every turn is cut off at the ceiling.
#[test]
fn review_stops_at_step_ceiling() {
    let repo = TestRepo::new().expect("repo");
    repo.write("lib.rs", "fn a() {}\n").expect("write");
    repo.commit_all("init").expect("commit");
    repo.write("lib.rs", "fn a() { todo() }\n").expect("write");
    let root_dir = repo.path().display().to_string();

    let turns = (0..15)
        .map(|i| ScriptedTurn::Reply {
            chunks: vec![format!("step {i}. ")],
            tool_calls: vec![call(
                &format!("call_{i}"),
                DIFF_TOOL,
                json!({ "rootDir": root_dir }),
            )],
        })
        .collect();
    let provider = ScriptedProvider::new(turns);
    let mut settings = settings();
    settings.max_steps = 4;
    let mut sink = Vec::new();

    let outcome = run_review(&provider, &settings, repo.path(), &mut sink).expect("review");

    assert_eq!(outcome.state, SessionState::StepLimitReached);
    assert_eq!(outcome.steps, 4);
    assert_eq!(provider.calls(), 4);
    assert_eq!(
        String::from_utf8(sink).expect("utf8"),
        "step 0. step 1. step 2. step 3. "
    );
    let requests = provider.requests();
    let results = tool_results(&requests[3].messages);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0][0]["file"], "lib.rs");
}
