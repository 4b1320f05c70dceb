//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry mapping tool names to their descriptors
//! - Dispatch of tool calls: lookup, schema validation, handler execution
//! - Tool metadata for `tools/list`
//!
//! The registry is populated once at startup and read-only afterwards, so
//! concurrent dispatches share it without locking.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{CallToolResult, JsonObject, Tool, ToolAnnotations};
use tracing::{debug, error, info, instrument, warn};

use crate::core::config::Config;

use super::definitions::{CalculatorTool, CharCountTool, EnvioInitTool, WordCountTool};
use super::error::{RegistryError, ToolError};
use super::handlers::ToolHandler;
use super::schema::ParamSchema;

// ============================================================================
// Tool Descriptor
// ============================================================================

/// Everything the registry knows about one tool.
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ParamSchema,
    handler: Arc<dyn ToolHandler>,
    annotations: Option<ToolAnnotations>,
    output_schema: Option<Arc<JsonObject>>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParamSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
            annotations: None,
            output_schema: None,
        }
    }

    /// Attach behavioural hints shown to clients.
    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Attach a JSON Schema describing the structured content.
    pub fn with_output_schema(mut self, schema: JsonObject) -> Self {
        self.output_schema = Some(Arc::new(schema));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.schema.to_json_schema()),
            annotations: self.annotations.clone(),
            output_schema: self.output_schema.clone(),
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Hints for tools that only compute a value from their input.
pub fn pure_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(false),
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Fails if the name is empty or taken, or if the schema is malformed.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParamSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        self.register_descriptor(ToolDescriptor::new(name, description, schema, handler))
    }

    /// Register a fully built descriptor.
    pub fn register_descriptor(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if descriptor.name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateName(descriptor.name));
        }
        descriptor
            .schema
            .check()
            .map_err(|source| RegistryError::MalformedSchema {
                name: descriptor.name.clone(),
                source,
            })?;

        info!("Registering tool: {}", descriptor.name);
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names, in name order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Get all tools as Tool models (metadata), in name order.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.values().map(ToolDescriptor::to_tool).collect()
    }

    /// Dispatch a tool call.
    ///
    /// Always produces an envelope: unknown tools, invalid arguments, handler
    /// errors and handler panics all come back as `isError: true` results.
    #[instrument(skip(self, arguments))]
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let Some(descriptor) = self.tools.get(name) else {
            warn!("Unknown tool requested: {}", name);
            return ToolError::not_found(name).into_result();
        };

        let params = match descriptor.schema.validate(arguments.as_ref()) {
            Ok(params) => params,
            Err(e) => {
                warn!("Rejected arguments for '{}': {}", name, e);
                return ToolError::from(e).into_result();
            }
        };

        debug!("Executing tool '{}'", name);

        match AssertUnwindSafe(descriptor.handler.call(params))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("Tool '{}' failed: {}", name, e);
                e.into_result()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Tool '{}' panicked: {}", name, message);
                ToolError::internal(message).into_result()
            }
        }
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Build the registry with all built-in tools.
///
/// Any registration failure is a startup error.
pub fn build_registry(config: Arc<Config>) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register_descriptor(CalculatorTool::descriptor())?;
    registry.register_descriptor(WordCountTool::descriptor())?;
    registry.register_descriptor(CharCountTool::descriptor())?;
    registry.register_descriptor(EnvioInitTool::descriptor(config))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::{first_text, is_error, text_result};
    use crate::domains::tools::handlers::handler_fn;
    use crate::domains::tools::schema::{Field, ValidatedParams};
    use serde_json::json;

    fn echo_schema() -> ParamSchema {
        ParamSchema::new().field(Field::string("message").non_empty())
    }

    fn echo_handler() -> Arc<dyn ToolHandler> {
        handler_fn(|params: ValidatedParams| async move {
            let message = params
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            Ok(text_result(message))
        })
    }

    fn args(value: serde_json::Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[test]
    fn test_build_registry() {
        let registry = build_registry(Arc::new(Config::default())).unwrap();
        assert_eq!(registry.len(), 4);

        let names = registry.tool_names();
        assert!(names.contains(&"calculate"));
        assert!(names.contains(&"word_count"));
        assert!(names.contains(&"char_count"));
        assert!(names.contains(&"envio_init_indexer"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry
            .register("echo", "Echo", echo_schema(), echo_handler())
            .unwrap();

        let err = registry
            .register("echo", "Echo again", echo_schema(), echo_handler())
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(ref n) if n == "echo"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("echo").unwrap().description(), "Echo");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register("", "Nameless", echo_schema(), echo_handler())
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));
    }

    #[test]
    fn test_malformed_schema_rejected() {
        let mut registry = ToolRegistry::new();
        let schema = ParamSchema::new()
            .field(Field::string("x"))
            .field(Field::string("x"));
        let err = registry
            .register("broken", "Broken", schema, echo_handler())
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSchema { .. }));
        assert!(!registry.contains("broken"));
    }

    #[tokio::test]
    async fn test_distinct_tools_dispatch_independently() {
        let mut registry = ToolRegistry::new();
        registry
            .register("echo", "Echo", echo_schema(), echo_handler())
            .unwrap();
        registry
            .register(
                "shout",
                "Shout",
                echo_schema(),
                handler_fn(|params: ValidatedParams| async move {
                    let message = params
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_uppercase();
                    Ok(text_result(message))
                }),
            )
            .unwrap();

        let echoed = registry.dispatch("echo", args(json!({ "message": "hi" }))).await;
        let shouted = registry.dispatch("shout", args(json!({ "message": "hi" }))).await;
        assert_eq!(first_text(&echoed), Some("hi"));
        assert_eq!(first_text(&shouted), Some("HI"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.dispatch("missing", None).await;
        assert!(is_error(&result));
        assert_eq!(first_text(&result), Some("Tool not found: missing"));
    }

    #[tokio::test]
    async fn test_dispatch_invalid_arguments() {
        let mut registry = ToolRegistry::new();
        registry
            .register("echo", "Echo", echo_schema(), echo_handler())
            .unwrap();

        let result = registry.dispatch("echo", args(json!({ "message": "" }))).await;
        assert!(is_error(&result));
        let text = first_text(&result).unwrap();
        assert!(text.starts_with("Invalid parameters"));
        assert!(text.contains("message"));
    }

    #[tokio::test]
    async fn test_dispatch_handler_error() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                "fails",
                "Always fails",
                ParamSchema::new(),
                handler_fn(|_params: ValidatedParams| async move {
                    Err(ToolError::unsupported("not today"))
                }),
            )
            .unwrap();

        let result = registry.dispatch("fails", None).await;
        assert!(is_error(&result));
        assert_eq!(first_text(&result), Some("not today"));
    }

    #[tokio::test]
    async fn test_dispatch_catches_panics() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                "panics",
                "Always panics",
                ParamSchema::new(),
                handler_fn(|_params: ValidatedParams| async move {
                    if true {
                        panic!("handler exploded");
                    }
                    Ok(text_result("unreachable"))
                }),
            )
            .unwrap();

        let result = registry.dispatch("panics", None).await;
        assert!(is_error(&result));
        assert_eq!(first_text(&result), Some("Internal error: handler exploded"));

        // The registry keeps serving after a panic.
        let again = registry.dispatch("panics", None).await;
        assert!(is_error(&again));
    }

    #[test]
    fn test_list_tools_metadata() {
        let registry = build_registry(Arc::new(Config::default())).unwrap();
        let tools = registry.list_tools();
        assert_eq!(tools.len(), registry.len());

        let calculator = tools.iter().find(|t| t.name == "calculate").unwrap();
        assert!(calculator.description.is_some());
        assert_eq!(calculator.input_schema["type"], "object");
        assert!(calculator.output_schema.is_some());
    }

    #[test]
    fn test_output_schema_from_schemars() {
        #[derive(schemars::JsonSchema)]
        #[allow(dead_code)]
        struct EchoOutput {
            message: String,
        }

        let descriptor = ToolDescriptor::new("echo", "Echo", echo_schema(), echo_handler())
            .with_output_schema(rmcp::handler::server::tool::schema_for_type::<EchoOutput>());
        let tool = descriptor.to_tool();

        let output_schema = tool.output_schema.unwrap();
        assert_eq!(output_schema["type"], "object");
        assert!(output_schema["properties"]["message"].is_object());
    }

    #[test]
    fn test_dispatch_is_deterministic() {
        let registry = build_registry(Arc::new(Config::default())).unwrap();
        let call = || {
            tokio_test::block_on(
                registry.dispatch("word_count", args(json!({ "text": "one two three" }))),
            )
        };
        let first = call();
        let second = call();
        assert_eq!(first_text(&first), Some("3"));
        assert_eq!(first_text(&first), first_text(&second));
    }
}
