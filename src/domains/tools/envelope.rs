//! Response envelope helpers.
//!
//! Every tool answers with an rmcp [`CallToolResult`]: an ordered list of
//! content blocks plus an `isError` flag. Only text content is produced here;
//! tools with machine-readable output attach it as structured content next to
//! a human-readable text block.

use rmcp::model::{CallToolResult, Content, RawContent};
use serde::Serialize;
use tracing::warn;

/// Successful result with a single text block.
pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Failed result with a single text block.
pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message.into())])
}

/// Successful result with a text summary and structured content.
///
/// If `data` cannot be serialized the result degrades to the text summary.
pub fn structured_result<T: Serialize>(summary: impl Into<String>, data: &T) -> CallToolResult {
    let structured_content = match serde_json::to_value(data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Failed to serialize structured content: {}", e);
            None
        }
    };

    CallToolResult {
        content: vec![Content::text(summary.into())],
        structured_content,
        is_error: Some(false),
        meta: None,
    }
}

/// Whether the result reports a failure. An absent flag means success.
pub fn is_error(result: &CallToolResult) -> bool {
    result.is_error.unwrap_or(false)
}

/// Text of the first content block, if it is a text block.
pub fn first_text(result: &CallToolResult) -> Option<&str> {
    result.content.first().and_then(|content| match &content.raw {
        RawContent::Text(text) => Some(text.text.as_str()),
        _ => None,
    })
}
