//! Text statistics tools.
//!
//! Two independent, pure tools: `word_count` and `char_count`.

use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domains::tools::envelope::structured_result;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;
use crate::domains::tools::registry::{ToolDescriptor, pure_annotations};
use crate::domains::tools::schema::{Field, ParamSchema, ValidatedParams};

/// Count of words or characters.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CountResult {
    pub count: usize,
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of characters in `text`, optionally ignoring whitespace.
pub fn char_count(text: &str, include_whitespace: bool) -> usize {
    if include_whitespace {
        text.chars().count()
    } else {
        text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

fn count_result(count: usize) -> CallToolResult {
    structured_result(count.to_string(), &CountResult { count })
}

// ============================================================================
// word_count
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WordCountParams {
    pub text: String,
}

/// Word counting tool.
pub struct WordCountTool;

impl WordCountTool {
    pub const NAME: &'static str = "word_count";

    pub const DESCRIPTION: &'static str =
        "Count the words in a text. Words are separated by runs of whitespace; blank text has zero words.";

    pub fn schema() -> ParamSchema {
        ParamSchema::new().field(Field::string("text").describe("Text to analyse"))
    }

    pub fn execute(params: &WordCountParams) -> CallToolResult {
        let count = word_count(&params.text);
        debug!("word_count: {} words", count);
        count_result(count)
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::schema(), Arc::new(Self))
            .with_annotations(pure_annotations())
            .with_output_schema(schema_for_type::<CountResult>())
    }
}

#[async_trait::async_trait]
impl ToolHandler for WordCountTool {
    async fn call(&self, params: ValidatedParams) -> Result<CallToolResult, ToolError> {
        let params: WordCountParams = params.deserialize()?;
        Ok(Self::execute(&params))
    }
}

// ============================================================================
// char_count
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharCountParams {
    pub text: String,
    #[serde(default)]
    pub include_whitespace: bool,
}

/// Character counting tool.
pub struct CharCountTool;

impl CharCountTool {
    pub const NAME: &'static str = "char_count";

    pub const DESCRIPTION: &'static str =
        "Count the characters in a text. Whitespace is excluded unless includeWhitespace is true.";

    pub fn schema() -> ParamSchema {
        ParamSchema::new()
            .field(Field::string("text").describe("Text to analyse"))
            .field(
                Field::boolean("includeWhitespace")
                    .default_value(json!(false))
                    .describe("Count whitespace characters too (default: false)"),
            )
    }

    pub fn execute(params: &CharCountParams) -> CallToolResult {
        let count = char_count(&params.text, params.include_whitespace);
        debug!(
            "char_count: {} characters (include_whitespace={})",
            count, params.include_whitespace
        );
        count_result(count)
    }

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::schema(), Arc::new(Self))
            .with_annotations(pure_annotations())
            .with_output_schema(schema_for_type::<CountResult>())
    }
}

#[async_trait::async_trait]
impl ToolHandler for CharCountTool {
    async fn call(&self, params: ValidatedParams) -> Result<CallToolResult, ToolError> {
        let params: CharCountParams = params.deserialize()?;
        Ok(Self::execute(&params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::{first_text, is_error};
    use crate::domains::tools::registry::ToolRegistry;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_descriptor(WordCountTool::descriptor()).unwrap();
        registry.register_descriptor(CharCountTool::descriptor()).unwrap();
        registry
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  "), 0);
        assert_eq!(word_count("a b  c"), 3);
        assert_eq!(word_count("\thello\nworld \r\n"), 2);
        assert_eq!(word_count("single"), 1);
    }

    #[test]
    fn test_char_count() {
        assert_eq!(char_count("a b", false), 2);
        assert_eq!(char_count("a b", true), 3);
        assert_eq!(char_count("", true), 0);
        assert_eq!(char_count(" \t\n", false), 0);
        assert_eq!(char_count("héllo wörld", false), 10);
    }

    #[tokio::test]
    async fn test_char_count_defaults_to_excluding_whitespace() {
        let registry = registry();

        let omitted = registry
            .dispatch(CharCountTool::NAME, json!({ "text": "a b" }).as_object().cloned())
            .await;
        let explicit = registry
            .dispatch(
                CharCountTool::NAME,
                json!({ "text": "a b", "includeWhitespace": false })
                    .as_object()
                    .cloned(),
            )
            .await;
        let with_ws = registry
            .dispatch(
                CharCountTool::NAME,
                json!({ "text": "a b", "includeWhitespace": true })
                    .as_object()
                    .cloned(),
            )
            .await;

        assert_eq!(first_text(&omitted), Some("2"));
        assert_eq!(first_text(&explicit), Some("2"));
        assert_eq!(first_text(&with_ws), Some("3"));
    }

    #[tokio::test]
    async fn test_word_count_dispatch() {
        let registry = registry();
        let result = registry
            .dispatch(WordCountTool::NAME, json!({ "text": "  " }).as_object().cloned())
            .await;
        assert!(!is_error(&result));
        assert_eq!(first_text(&result), Some("0"));
        assert_eq!(result.structured_content.unwrap()["count"], 0);
    }

    #[tokio::test]
    async fn test_missing_text_is_invalid() {
        let registry = registry();
        let result = registry.dispatch(WordCountTool::NAME, None).await;
        assert!(is_error(&result));
        assert!(first_text(&result).unwrap().contains("'text' is required"));
    }

    #[tokio::test]
    async fn test_wrong_type_is_invalid() {
        let registry = registry();
        let result = registry
            .dispatch(
                CharCountTool::NAME,
                json!({ "text": "abc", "includeWhitespace": "yes" })
                    .as_object()
                    .cloned(),
            )
            .await;
        assert!(is_error(&result));
        assert!(first_text(&result).unwrap().contains("must be a boolean"));
    }
}
