//! Bounded-step generation loop between the model and the tool registry.
//!
//! One step is one provider turn. Text increments go to the sink as they
//! arrive; tool calls run one at a time and their results are appended to the
//! transcript before the next turn. The loop stops when a turn requests no
//! tools, when the step ceiling is reached, or when the provider fails.

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::types::{ChatMessage, SessionState};
use crate::io::provider::{ChatProvider, TurnRequest};
use crate::tools::{ToolRegistry, tool_result_content};

/// Inputs for one session. Read-only while the session runs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
    pub tools: ToolRegistry,
    pub max_steps: u32,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub state: SessionState,
    /// Generation turns taken.
    pub steps: u32,
    /// Tool invocations executed, including failed ones.
    pub tool_calls: u32,
    /// Everything streamed to the sink, in order.
    pub text: String,
}

/// Drive `provider` until the model stops calling tools or `max_steps` turns
/// have run.
///
/// On provider failure the text already written to `sink` stays there and the
/// error is returned with the failing step as context.
#[instrument(skip_all, fields(model = %config.model, max_steps = config.max_steps, tools = config.tools.len()))]
pub fn run_session<P: ChatProvider + ?Sized>(
    provider: &P,
    config: &SessionConfig,
    sink: &mut dyn Write,
) -> Result<SessionOutcome> {
    if config.max_steps == 0 {
        return Err(anyhow!("max_steps must be > 0"));
    }

    let definitions = config.tools.definitions();
    let mut transcript = vec![
        ChatMessage::System(config.system_prompt.clone()),
        ChatMessage::User(config.prompt.clone()),
    ];
    let mut state = SessionState::Idle;
    let mut outcome_text = String::new();
    let mut steps = 0u32;
    let mut tool_calls = 0u32;

    while !state.is_terminal() {
        transition(&mut state, SessionState::Streaming);
        steps += 1;

        let request = TurnRequest {
            model: &config.model,
            messages: &transcript,
            tools: &definitions,
        };
        let mut forward = |chunk: &str| -> std::io::Result<()> {
            sink.write_all(chunk.as_bytes())?;
            sink.flush()
        };
        let turn = match provider.stream_turn(&request, &mut forward) {
            Ok(turn) => turn,
            Err(err) => {
                transition(&mut state, SessionState::Failed);
                return Err(err)
                    .with_context(|| format!("generation failed at step {steps} ({state:?})"));
            }
        };
        outcome_text.push_str(&turn.text);

        if turn.tool_calls.is_empty() {
            transition(&mut state, SessionState::Completed);
            continue;
        }

        transition(&mut state, SessionState::AwaitingToolResult);
        let calls = turn.tool_calls;
        transcript.push(ChatMessage::Assistant {
            content: turn.text,
            tool_calls: calls.clone(),
        });
        for call in &calls {
            tool_calls += 1;
            let result = config.tools.invoke(&call.name, &call.arguments);
            transcript.push(ChatMessage::Tool {
                tool_call_id: call.id.clone(),
                content: tool_result_content(&result),
            });
        }

        if steps >= config.max_steps {
            warn!(steps, "step ceiling reached with tool calls still pending");
            transition(&mut state, SessionState::StepLimitReached);
        }
    }

    Ok(SessionOutcome {
        state,
        steps,
        tool_calls,
        text: outcome_text,
    })
}

fn transition(state: &mut SessionState, to: SessionState) {
    debug!(from = ?*state, ?to, "session state");
    *state = to;
}
