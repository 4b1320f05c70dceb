//! Tool handler abstraction.
//!
//! A handler receives arguments that already passed its tool's schema and
//! returns either a result envelope or a [`ToolError`]. The registry turns
//! errors (and panics) into `isError` envelopes, so handlers never need to
//! build error results themselves.

use std::future::Future;
use std::sync::Arc;

use rmcp::model::CallToolResult;

use super::error::ToolError;
use super::schema::ValidatedParams;

/// Trait for implementing tool handlers.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with schema-validated arguments.
    async fn call(&self, params: ValidatedParams) -> Result<CallToolResult, ToolError>;
}

/// Handler backed by an async closure.
pub struct FnHandler<F>(F);

#[async_trait::async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(ValidatedParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CallToolResult, ToolError>> + Send + 'static,
{
    async fn call(&self, params: ValidatedParams) -> Result<CallToolResult, ToolError> {
        (self.0)(params).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(ValidatedParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<CallToolResult, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::{first_text, text_result};

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|params: ValidatedParams| async move {
            let count = params.as_object().len();
            Ok(text_result(count.to_string()))
        });

        let result = handler.call(ValidatedParams::default()).await.unwrap();
        assert_eq!(first_text(&result), Some("0"));
    }

    #[tokio::test]
    async fn test_handler_fn_error() {
        let handler = handler_fn(|_params: ValidatedParams| async move {
            Err(ToolError::internal("nope"))
        });

        let err = handler.call(ValidatedParams::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Internal error: nope");
    }
}
