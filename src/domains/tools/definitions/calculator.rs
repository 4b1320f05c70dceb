//! Calculator tool definition.
//!
//! Basic arithmetic on two finite numbers. Division by zero and non-finite
//! results are reported as tool errors instead of producing `inf` or `NaN`.

use std::fmt;
use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::domains::tools::envelope::structured_result;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;
use crate::domains::tools::registry::{ToolDescriptor, pure_annotations};
use crate::domains::tools::schema::{Field, ParamSchema, ValidatedParams};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Supported arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    pub const NAMES: [&'static str; 4] = ["add", "subtract", "multiply", "divide"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for the calculator tool.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculatorParams {
    pub a: f64,
    pub b: f64,
    pub operation: Operation,
}

// ============================================================================
// Output Structure
// ============================================================================

/// Result of a calculation.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CalculationResult {
    /// Operation that was applied
    pub operation: Operation,
    /// First operand
    pub a: f64,
    /// Second operand
    pub b: f64,
    /// Outcome of `a <operation> b`
    pub result: f64,
}

/// Apply `operation` to `a` and `b`.
pub fn calculate(a: f64, b: f64, operation: Operation) -> Result<f64, ToolError> {
    let result = match operation {
        Operation::Add => a + b,
        Operation::Subtract => a - b,
        Operation::Multiply => a * b,
        Operation::Divide => {
            if b == 0.0 {
                return Err(ToolError::DivisionByZero);
            }
            a / b
        }
    };

    if !result.is_finite() {
        return Err(ToolError::overflow(format!(
            "result of {} {} {} is not a finite number",
            a, operation, b
        )));
    }

    Ok(result)
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Calculator tool - add, subtract, multiply or divide two numbers.
pub struct CalculatorTool;

impl CalculatorTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "calculate";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Perform basic arithmetic (add, subtract, multiply, divide) on two numbers. Division by zero and results that overflow are reported as errors.";

    /// Declared input shape.
    pub fn schema() -> ParamSchema {
        ParamSchema::new()
            .field(Field::number("a").finite().describe("First operand"))
            .field(Field::number("b").finite().describe("Second operand"))
            .field(
                Field::enumeration("operation", &Operation::NAMES)
                    .describe("Arithmetic operation to apply"),
            )
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(operation = %params.operation))]
    pub fn execute(params: &CalculatorParams) -> Result<CallToolResult, ToolError> {
        info!("Calculator called: {} {} {}", params.a, params.operation, params.b);

        let result = calculate(params.a, params.b, params.operation)?;

        let output = CalculationResult {
            operation: params.operation,
            a: params.a,
            b: params.b,
            result,
        };
        Ok(structured_result(result.to_string(), &output))
    }

    /// Create the registry descriptor for this tool.
    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, Self::schema(), Arc::new(Self))
            .with_annotations(pure_annotations())
            .with_output_schema(schema_for_type::<CalculationResult>())
    }
}

#[async_trait::async_trait]
impl ToolHandler for CalculatorTool {
    async fn call(&self, params: ValidatedParams) -> Result<CallToolResult, ToolError> {
        let params: CalculatorParams = params.deserialize()?;
        Self::execute(&params)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::{first_text, is_error};
    use crate::domains::tools::registry::ToolRegistry;
    use serde_json::json;

    fn run(a: f64, b: f64, operation: Operation) -> Result<CallToolResult, ToolError> {
        CalculatorTool::execute(&CalculatorParams { a, b, operation })
    }

    #[test]
    fn test_basic_operations() {
        assert_eq!(calculate(2.0, 3.0, Operation::Add).unwrap(), 5.0);
        assert_eq!(calculate(2.0, 3.0, Operation::Subtract).unwrap(), -1.0);
        assert_eq!(calculate(2.0, 3.0, Operation::Multiply).unwrap(), 6.0);
        assert_eq!(calculate(3.0, 2.0, Operation::Divide).unwrap(), 1.5);
        assert_eq!(calculate(-0.5, 0.25, Operation::Add).unwrap(), -0.25);
    }

    #[test]
    fn test_result_text() {
        let result = run(2.0, 3.0, Operation::Add).unwrap();
        assert!(!is_error(&result));
        assert_eq!(first_text(&result), Some("5"));

        let result = run(1.0, 4.0, Operation::Divide).unwrap();
        assert_eq!(first_text(&result), Some("0.25"));
    }

    #[test]
    fn test_division_by_zero() {
        for a in [0.0, 1.0, -7.5, 1e308] {
            let err = calculate(a, 0.0, Operation::Divide).unwrap_err();
            assert!(matches!(err, ToolError::DivisionByZero));
        }

        let err = calculate(1.0, -0.0, Operation::Divide).unwrap_err();
        assert!(err.to_string().contains("Division by zero"));
    }

    #[test]
    fn test_overflow() {
        let err = calculate(1e308, 1e308, Operation::Multiply).unwrap_err();
        assert!(matches!(err, ToolError::NumericOverflow(_)));
        assert!(err.to_string().contains("overflow"));

        let err = calculate(f64::MAX, f64::MAX, Operation::Add).unwrap_err();
        assert!(matches!(err, ToolError::NumericOverflow(_)));

        let err = calculate(1e308, 1e-308, Operation::Divide).unwrap_err();
        assert!(matches!(err, ToolError::NumericOverflow(_)));
    }

    #[test]
    fn test_structured_content() {
        let result = run(6.0, 7.0, Operation::Multiply).unwrap();
        let structured = result.structured_content.expect("structured_content should exist");
        assert_eq!(structured["operation"], "multiply");
        assert_eq!(structured["result"], 42.0);
    }

    #[test]
    fn test_schema_is_well_formed() {
        assert!(CalculatorTool::schema().check().is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_errors_are_in_band() {
        let mut registry = ToolRegistry::new();
        registry.register_descriptor(CalculatorTool::descriptor()).unwrap();

        let args = json!({ "a": 5, "b": 0, "operation": "divide" });
        let result = registry
            .dispatch(CalculatorTool::NAME, args.as_object().cloned())
            .await;
        assert!(is_error(&result));
        assert!(first_text(&result).unwrap().contains("Division by zero"));

        let args = json!({ "a": 1e308, "b": 1e308, "operation": "multiply" });
        let result = registry
            .dispatch(CalculatorTool::NAME, args.as_object().cloned())
            .await;
        assert!(is_error(&result));
        assert!(first_text(&result).unwrap().contains("overflow"));
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_operation() {
        let mut registry = ToolRegistry::new();
        registry.register_descriptor(CalculatorTool::descriptor()).unwrap();

        let args = json!({ "a": 1, "b": 2, "operation": "modulo" });
        let result = registry
            .dispatch(CalculatorTool::NAME, args.as_object().cloned())
            .await;
        assert!(is_error(&result));
        assert!(first_text(&result).unwrap().contains("operation"));
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let mut registry = ToolRegistry::new();
        registry.register_descriptor(CalculatorTool::descriptor()).unwrap();

        let args = json!({ "a": 10, "b": 4, "operation": "subtract" });
        let result = registry
            .dispatch(CalculatorTool::NAME, args.as_object().cloned())
            .await;
        assert!(!is_error(&result));
        assert_eq!(first_text(&result), Some("6"));
    }
}
