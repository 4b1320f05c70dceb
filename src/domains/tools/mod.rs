//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `schema.rs` - Declarative parameter schemas and validation
//! - `registry.rs` - Tool registry and dispatch
//! - `handlers.rs` - Handler trait implemented by every tool
//! - `envelope.rs` - Helpers for building tool results
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Declare its `ParamSchema`, typed params and `ToolHandler` impl
//! 3. Export in `definitions/mod.rs`
//! 4. Register its descriptor in `build_registry()` in `registry.rs`
//!
//! **No need to modify `server.rs`!** Listing and dispatch go through the registry.

pub mod definitions;
pub mod envelope;
mod error;
mod handlers;
mod registry;
pub mod schema;

pub use error::{RegistryError, ToolError};
pub use handlers::{FnHandler, ToolHandler, handler_fn};
pub use registry::{ToolDescriptor, ToolRegistry, build_registry, pure_annotations};
pub use schema::{
    Constraint, Field, FieldKind, ParamSchema, Pattern, SchemaError, ValidatedParams,
    ValidationError,
};
