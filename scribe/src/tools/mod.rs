//! Tool registry: named, schema-validated functions the model may call.
//!
//! Every tool declares a JSON Schema for its input. The registry validates
//! model-supplied arguments against it before dispatch, and turns any failure
//! (bad JSON, schema violation, unknown tool, handler error) into a tool-result
//! payload for the model rather than an error for the process.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::error::ToolError;

pub mod builtin;

/// Tool handler: validated input in, JSON result out.
pub type ToolHandler = dyn Fn(&Value) -> Result<Value, ToolError> + Send + Sync;

/// Name, description and parameter schema as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A registered tool with its compiled input validator.
pub struct ToolSpec {
    definition: ToolDefinition,
    validator: Validator,
    handler: Box<ToolHandler>,
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.definition.name)
            .finish_non_exhaustive()
    }
}

impl ToolSpec {
    /// Compile `schema` (JSON Schema draft 2020-12) and bind it to `handler`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        handler: impl Fn(&Value) -> Result<Value, ToolError> + Send + Sync + 'static,
    ) -> Result<Self> {
        let name = name.into();
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .with_context(|| format!("compile input schema for tool {name}"))?;
        Ok(Self {
            definition: ToolDefinition {
                name,
                description: description.into(),
                parameters: schema,
            },
            validator,
            handler: Box::new(handler),
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Validate `input` against the schema, then run the handler.
    pub fn call(&self, input: &Value) -> Result<Value, ToolError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(input)
            .map(|err| err.to_string())
            .collect();
        if !violations.is_empty() {
            return Err(ToolError::Validation(violations.join("; ")));
        }
        (self.handler)(input)
    }
}

/// Set of tools with unique names.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolSpec>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `spec`; names must be unique within a registry.
    pub fn register(&mut self, spec: ToolSpec) -> Result<()> {
        if self.tools.contains_key(spec.name()) {
            return Err(anyhow!("tool '{}' is already registered", spec.name()));
        }
        self.tools.insert(spec.name().to_string(), Arc::new(spec));
        Ok(())
    }

    /// Registry containing only the named tools.
    pub fn subset(&self, names: &[&str]) -> Result<ToolRegistry> {
        let mut tools = BTreeMap::new();
        for name in names {
            let spec = self
                .tools
                .get(*name)
                .ok_or_else(|| anyhow!("unknown tool '{name}'"))?;
            tools.insert(name.to_string(), Arc::clone(spec));
        }
        Ok(ToolRegistry { tools })
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Definitions for the provider request, in name order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|spec| spec.definition().clone())
            .collect()
    }

    /// Parse, validate, and run a model-requested call.
    #[instrument(skip(self, raw_arguments))]
    pub fn invoke(&self, name: &str, raw_arguments: &str) -> Result<Value, ToolError> {
        let spec = self.tools.get(name).ok_or_else(|| {
            ToolError::Validation(format!(
                "unknown tool '{name}'; available tools: {}",
                self.names().join(", ")
            ))
        })?;
        let raw = raw_arguments.trim();
        let input: Value = if raw.is_empty() {
            json!({})
        } else {
            serde_json::from_str(raw)
                .map_err(|err| ToolError::Validation(format!("arguments are not valid JSON: {err}")))?
        };
        if !input.is_object() {
            return Err(ToolError::Validation(
                "arguments must be a JSON object".to_string(),
            ));
        }
        let result = spec.call(&input);
        match &result {
            Ok(_) => debug!("tool call succeeded"),
            Err(err) => warn!(kind = err.kind(), err = %err, "tool call failed"),
        }
        result
    }
}

/// Render a tool outcome as the content of a tool-result message.
pub fn tool_result_content(result: &Result<Value, ToolError>) -> String {
    let value = match result {
        Ok(value) => value.clone(),
        Err(err) => json!({
            "error": { "kind": err.kind(), "message": err.to_string() }
        }),
    };
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool(name: &str) -> ToolSpec {
        ToolSpec::new(
            name,
            "echo the input",
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "minLength": 1 },
                    "times": { "type": "integer", "exclusiveMinimum": 0, "maximum": 3 }
                },
                "required": ["text"]
            }),
            |input| Ok(json!({ "echo": input["text"] })),
        )
        .expect("tool")
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).expect("first");
        let err = registry.register(echo_tool("echo")).expect_err("duplicate");
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn invoke_runs_handler_on_valid_input() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).expect("register");
        let value = registry
            .invoke("echo", r#"{"text":"hi","times":2}"#)
            .expect("invoke");
        assert_eq!(value, json!({ "echo": "hi" }));
    }

    #[test]
    fn invoke_reports_schema_violations_as_validation() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).expect("register");

        for raw in [r#"{}"#, r#"{"text":""}"#, r#"{"text":"a","times":9}"#, "[1]", "{not json"] {
            let err = registry.invoke("echo", raw).expect_err(raw);
            assert!(matches!(err, ToolError::Validation(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn unknown_tool_is_a_validation_error() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("echo")).expect("register");
        let err = registry.invoke("rm_rf", "{}").expect_err("unknown");
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(err.to_string().contains("available tools: echo"));
    }

    #[test]
    fn subset_keeps_only_named_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool("a")).expect("a");
        registry.register(echo_tool("b")).expect("b");

        let subset = registry.subset(&["b"]).expect("subset");
        assert_eq!(subset.names(), vec!["b"]);
        assert_eq!(subset.len(), 1);
        assert!(ToolRegistry::new().is_empty());
        assert!(registry.subset(&["c"]).is_err());
    }

    #[test]
    fn error_result_content_carries_kind_and_message() {
        let content = tool_result_content(&Err(ToolError::Validation("bad".to_string())));
        let value: Value = serde_json::from_str(&content).expect("json");
        assert_eq!(value["error"]["kind"], "validation");
        assert_eq!(value["error"]["message"], "invalid input: bad");
    }
}
