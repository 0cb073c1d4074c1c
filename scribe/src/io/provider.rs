//! Hosted text-generation provider.
//!
//! The [`ChatProvider`] trait decouples the session orchestrator from the
//! actual model backend. Production uses [`OpenAiCompatProvider`], which
//! streams an OpenAI-compatible `/chat/completions` response; tests use a
//! scripted provider that replays canned turns.

use std::collections::BTreeMap;
use std::io::BufRead;

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::core::types::{ChatMessage, ToolCall};
use crate::error::ProviderError;
use crate::io::config::ScribeConfig;
use crate::tools::ToolDefinition;

/// Everything the provider needs for one generation turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolDefinition],
}

/// One finished generation turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelTurn {
    /// Full text produced during the turn (already forwarded incrementally).
    pub text: String,
    /// Tool calls the model requested, in index order.
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

/// Callback receiving text increments in arrival order.
pub type TextSink<'a> = dyn FnMut(&str) -> std::io::Result<()> + 'a;

/// Abstraction over model backends.
pub trait ChatProvider {
    /// Run one generation turn, passing each text increment to `on_text` as
    /// it arrives.
    fn stream_turn(
        &self,
        request: &TurnRequest<'_>,
        on_text: &mut TextSink<'_>,
    ) -> Result<ModelTurn, ProviderError>;
}

/// Provider speaking the OpenAI-compatible streaming chat completions API.
///
/// A missing API key is reported on the first turn, not at construction, so
/// tasks that never reach the model run without credentials.
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    endpoint: String,
    api_key: Option<String>,
    api_key_env: String,
    client: Client,
}

impl OpenAiCompatProvider {
    /// `api_key_env` names where the key was looked up; it is reported when
    /// `api_key` is `None`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        api_key_env: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            api_key_env: api_key_env.into(),
            client,
        })
    }

    /// Build a provider from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(cfg: &ScribeConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&cfg.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            debug!(env = %cfg.api_key_env, "api key not set");
        }
        Self::new(
            cfg.endpoint.clone(),
            api_key,
            cfg.api_key_env.clone(),
            cfg.request_timeout(),
        )
    }
}

impl ChatProvider for OpenAiCompatProvider {
    #[instrument(skip_all, fields(model = request.model, messages = request.messages.len(), tools = request.tools.len()))]
    fn stream_turn(
        &self,
        request: &TurnRequest<'_>,
        on_text: &mut TextSink<'_>,
    ) -> Result<ModelTurn, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingApiKey(self.api_key_env.clone()))?;
        let payload = build_payload(request);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), "provider returned error status");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        read_event_stream(std::io::BufReader::new(response), on_text)
    }
}

/// Serialize a turn request into a chat completions payload.
pub fn build_payload(request: &TurnRequest<'_>) -> Value {
    let messages: Vec<Value> = request.messages.iter().map(message_to_json).collect();
    let mut payload = json!({
        "model": request.model,
        "messages": messages,
        "stream": true,
    });
    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        payload["tools"] = Value::Array(tools);
        payload["tool_choice"] = json!("auto");
    }
    payload
}

fn message_to_json(message: &ChatMessage) -> Value {
    match message {
        ChatMessage::System(content) => json!({ "role": "system", "content": content }),
        ChatMessage::User(content) => json!({ "role": "user", "content": content }),
        ChatMessage::Assistant {
            content,
            tool_calls,
        } => {
            let mut value = json!({ "role": "assistant", "content": content });
            if !tool_calls.is_empty() {
                value["tool_calls"] = tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": { "name": call.name, "arguments": call.arguments },
                        })
                    })
                    .collect();
            }
            value
        }
        ChatMessage::Tool {
            tool_call_id,
            content,
        } => json!({ "role": "tool", "tool_call_id": tool_call_id, "content": content }),
    }
}

/// Consume a server-sent-events body, forwarding content deltas to `on_text`.
///
/// Lines other than `data:` are ignored; `data: [DONE]` ends the turn early.
/// A body that ends without `[DONE]` or a `finish_reason` was cut off and is
/// an error.
pub fn read_event_stream<R: BufRead>(
    reader: R,
    on_text: &mut TextSink<'_>,
) -> Result<ModelTurn, ProviderError> {
    let mut turn = ModelTurn::default();
    let mut partial_calls: BTreeMap<u64, PartialToolCall> = BTreeMap::new();
    let mut done = false;

    for line in reader.lines() {
        let line = line.map_err(|err| ProviderError::Stream(format!("read error: {err}")))?;
        let Some(data) = line.trim().strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            done = true;
            break;
        }
        let event: Value = serde_json::from_str(data)
            .map_err(|err| ProviderError::Stream(format!("invalid event json: {err}")))?;
        if let Some(error) = event.get("error") {
            return Err(ProviderError::Stream(error.to_string()));
        }
        let Some(choice) = event
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        else {
            continue;
        };
        if let Some(reason) = choice.get("finish_reason").and_then(Value::as_str) {
            turn.finish_reason = Some(reason.to_string());
        }
        let Some(delta) = choice.get("delta") else {
            continue;
        };
        if let Some(content) = delta.get("content").and_then(Value::as_str)
            && !content.is_empty()
        {
            on_text(content)?;
            turn.text.push_str(content);
        }
        if let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) {
            merge_tool_call_deltas(calls, &mut partial_calls);
        }
    }
    if !done && turn.finish_reason.is_none() {
        return Err(ProviderError::Stream(format!(
            "stream ended before completion after {} bytes of text",
            turn.text.len()
        )));
    }

    turn.tool_calls = partial_calls
        .into_iter()
        .filter(|(_, call)| !call.name.trim().is_empty())
        .map(|(index, call)| ToolCall {
            id: call.id.unwrap_or_else(|| format!("call_{}", index + 1)),
            name: call.name,
            arguments: if call.arguments.trim().is_empty() {
                "{}".to_string()
            } else {
                call.arguments
            },
        })
        .collect();
    debug!(
        text_bytes = turn.text.len(),
        tool_calls = turn.tool_calls.len(),
        finish_reason = ?turn.finish_reason,
        "turn stream finished"
    );
    Ok(turn)
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Fold streamed tool-call fragments into per-index accumulators.
fn merge_tool_call_deltas(fragments: &[Value], out: &mut BTreeMap<u64, PartialToolCall>) {
    for (position, fragment) in fragments.iter().enumerate() {
        let index = fragment
            .get("index")
            .and_then(Value::as_u64)
            .unwrap_or(position as u64);
        let entry = out.entry(index).or_default();
        if let Some(id) = fragment.get("id").and_then(Value::as_str)
            && !id.trim().is_empty()
        {
            entry.id = Some(id.to_string());
        }
        let Some(function) = fragment.get("function") else {
            continue;
        };
        if let Some(name) = function.get("name").and_then(Value::as_str)
            && !name.trim().is_empty()
        {
            entry.name = name.to_string();
        }
        match function.get("arguments") {
            Some(Value::String(chunk)) => entry.arguments.push_str(chunk),
            Some(Value::Null) | None => {}
            Some(other) => entry.arguments.push_str(&other.to_string()),
        }
    }
}
