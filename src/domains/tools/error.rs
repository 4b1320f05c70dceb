//! Tool-specific error types.

use std::path::PathBuf;

use rmcp::model::CallToolResult;
use thiserror::Error;

use super::envelope::error_result;
use super::schema::{SchemaError, ValidationError};

/// Errors that can occur while dispatching or executing a tool.
///
/// None of these are fatal: every variant is reported to the client as an
/// `isError: true` result through [`ToolError::into_result`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The arguments did not satisfy the tool's schema.
    #[error(transparent)]
    InvalidParameters(#[from] ValidationError),

    /// Division with a zero divisor.
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    /// An arithmetic result that is not a finite number.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    /// Input that is well-formed but not handled yet.
    #[error("{0}")]
    Unsupported(String),

    /// The output directory could not be created.
    #[error("Failed to create output directory '{}': {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external command failed, including its fallback attempt.
    #[error("{0}")]
    CommandFailed(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid parameters" error for a single field.
    pub fn invalid_parameter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameters(ValidationError::single(field, message))
    }

    /// Create a new "numeric overflow" error.
    pub fn overflow(msg: impl Into<String>) -> Self {
        Self::NumericOverflow(msg.into())
    }

    /// Create a new "unsupported" error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a new "command failed" error.
    pub fn command_failed(msg: impl Into<String>) -> Self {
        Self::CommandFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Convert into an in-band error result for the client.
    pub fn into_result(self) -> CallToolResult {
        error_result(self.to_string())
    }
}

/// Errors raised while building the tool registry. Fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("Tool '{0}' is already registered")]
    DuplicateName(String),

    /// The tool name is empty.
    #[error("Tool name must not be empty")]
    EmptyName,

    /// The tool's parameter schema is malformed.
    #[error("Malformed schema for tool '{name}': {source}")]
    MalformedSchema {
        name: String,
        #[source]
        source: SchemaError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_into_result_sets_error_flag() {
        let result = ToolError::DivisionByZero.into_result();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Division by zero is not allowed");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = ToolError::invalid_parameter("a", "must be a finite number");
        assert_eq!(
            err.to_string(),
            "Invalid parameters: 'a' must be a finite number"
        );
    }

    #[test]
    fn test_directory_creation_message() {
        let err = ToolError::DirectoryCreation {
            path: PathBuf::from("/tmp/project"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("/tmp/project"));
        assert!(message.contains("denied"));
    }
}
