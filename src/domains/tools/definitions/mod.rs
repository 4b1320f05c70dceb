//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod calculator;
pub mod envio;
pub mod text;

pub use calculator::{CalculatorParams, CalculatorTool, Operation};
pub use envio::{EnvioInitParams, EnvioInitTool, Language};
pub use text::{CharCountParams, CharCountTool, WordCountParams, WordCountTool};
