//! Envio indexer scaffolding tool.
//!
//! Creates a new Envio indexer project by running the external `envio init`
//! generator. The tool resolves and creates the output directory, builds the
//! command line and hands it to the [`TwoAttemptRunner`].
//!
//! - `command`: generator command line
//! - `runner`: primary/fallback execution with bounded time

pub mod command;
pub mod runner;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::{CallToolResult, ToolAnnotations};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::config::{Config, EnvioConfig};
use crate::domains::tools::envelope::structured_result;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;
use crate::domains::tools::registry::ToolDescriptor;
use crate::domains::tools::schema::{Field, ParamSchema, ValidatedParams};

pub use command::{EnvioCommand, InitArgs};
pub use runner::{Attempt, AttemptFailure, RunOutcome, RunnerSettings, TwoAttemptRunner};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Language of the generated indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Rescript,
}

impl Language {
    pub const NAMES: [&'static str; 3] = ["javascript", "typescript", "rescript"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
            Self::Rescript => "rescript",
        }
    }
}

/// Parameters for the Envio init tool.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvioInitParams {
    pub name: String,
    pub contract_addresses: Vec<String>,
    pub networks: Vec<String>,
    pub api_token: String,
    pub language: Language,
    #[serde(default)]
    pub output_directory: Option<String>,
}

/// Custom Debug implementation to redact the API token from logs.
impl fmt::Debug for EnvioInitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvioInitParams")
            .field("name", &self.name)
            .field("contract_addresses", &self.contract_addresses)
            .field("networks", &self.networks)
            .field("api_token", &"[REDACTED]")
            .field("language", &self.language)
            .field("output_directory", &self.output_directory)
            .finish()
    }
}

// ============================================================================
// Output Structure
// ============================================================================

/// Result of a successful initialization.
#[derive(Debug, Serialize, JsonSchema)]
pub struct EnvioInitResult {
    /// Name of the new project
    pub project_name: String,
    /// Directory the project was generated in
    pub output_directory: String,
    /// Language of the generated project
    pub language: Language,
    /// Attempt that succeeded ("primary" or "fallback")
    pub attempt: Attempt,
    /// Captured generator output
    pub output: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Directory the project is generated in.
///
/// An absent or empty `output_directory` resolves to `<projects_dir>/<name>`,
/// where `projects_dir` defaults to `<home>/envio`. Any other value is used
/// verbatim.
pub fn resolve_output_dir(
    output_directory: Option<&str>,
    name: &str,
    projects_dir: Option<&Path>,
) -> Result<PathBuf, ToolError> {
    if let Some(dir) = output_directory.filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    if name == "." || name == ".." {
        return Err(ToolError::invalid_parameter(
            "name",
            "must not be '.' or '..' when no outputDirectory is given",
        ));
    }

    let projects_dir = projects_dir.ok_or_else(|| {
        ToolError::internal("Could not determine the home directory; please provide outputDirectory")
    })?;

    Ok(projects_dir.join(name))
}

/// The only element of `values`, rejecting empty and multi-valued input.
fn single_value<'a>(values: &'a [String], field: &str, label: &str) -> Result<&'a str, ToolError> {
    match values {
        [] => Err(ToolError::invalid_parameter(
            field,
            "must contain at least 1 element",
        )),
        [value] if value.trim().is_empty() => {
            Err(ToolError::invalid_parameter(field, "must not contain empty values"))
        }
        [value] => Ok(value.as_str()),
        _ => Err(ToolError::unsupported(format!(
            "Multiple {} are not supported yet. Please provide exactly one.",
            label
        ))),
    }
}

/// Runner timing from configuration.
pub fn runner_settings(config: &EnvioConfig) -> RunnerSettings {
    RunnerSettings {
        timeout: Duration::from_secs(config.timeout_secs),
        keystroke_delay: Duration::from_millis(config.keystroke_delay_ms),
        keystroke_interval: Duration::from_millis(config.keystroke_interval_ms),
        keystroke_count: config.keystroke_count,
    }
}

fn failure_report(
    name: &str,
    command: &EnvioCommand,
    primary: &AttemptFailure,
    fallback: &AttemptFailure,
) -> String {
    let mut report = format!("Failed to initialize Envio indexer '{}'.\n\n", name);

    for (label, failure) in [
        ("Primary attempt", primary),
        ("Fallback attempt (simulated Enter key presses)", fallback),
    ] {
        report.push_str(&format!("{}: {}\n", label, failure.reason));
        if !failure.output.is_empty() {
            report.push_str(&failure.output);
            report.push('\n');
        }
        report.push('\n');
    }

    report.push_str("Suggestions:\n");
    report.push_str(&format!(
        "- Run the command manually to answer any prompts: {}\n",
        command.display()
    ));
    report.push_str("- Check whether your Envio CLI version offers a non-interactive flag\n");
    report.push_str("- Consider automating the prompts with a dedicated tool such as `expect`");
    report
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Envio init tool - scaffolds a new indexer project.
pub struct EnvioInitTool {
    config: Arc<Config>,
}

impl EnvioInitTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "envio_init_indexer";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Initialize a new Envio indexer project for a contract by running `envio init`. Exactly one contract address and one network are supported. The project is created in outputDirectory, or in ~/envio/<name> when it is omitted or empty. May take several minutes.";

    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Declared input shape.
    pub fn schema() -> ParamSchema {
        ParamSchema::new()
            .field(
                Field::string("name")
                    .non_empty()
                    .pattern(r"^[^/\\]+$")
                    .describe("Project name, also used as the default directory name"),
            )
            .field(
                Field::string_array("contractAddresses")
                    .min_items(1)
                    .describe("Contract address to index (exactly one is supported)"),
            )
            .field(
                Field::string_array("networks")
                    .min_items(1)
                    .describe("Network identifier, e.g. a chain id (exactly one is supported)"),
            )
            .field(
                Field::string("apiToken")
                    .non_empty()
                    .describe("Envio API token"),
            )
            .field(
                Field::enumeration("language", &Language::NAMES)
                    .describe("Language of the generated indexer"),
            )
            .field(
                Field::string("outputDirectory")
                    .optional()
                    .empty_as_absent()
                    .describe("Directory to create the project in (default: ~/envio/<name>)"),
            )
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(name = %params.name))]
    pub async fn execute(
        params: &EnvioInitParams,
        config: &Config,
    ) -> Result<CallToolResult, ToolError> {
        info!("Envio init called: {:?}", params);

        let contract_address =
            single_value(&params.contract_addresses, "contractAddresses", "contract addresses")?;
        let network = single_value(&params.networks, "networks", "networks")?;

        let projects_dir = config.envio.projects_dir();
        let output_dir = resolve_output_dir(
            params.output_directory.as_deref(),
            &params.name,
            projects_dir.as_deref(),
        )?;

        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| ToolError::DirectoryCreation {
                path: output_dir.clone(),
                source,
            })?;
        info!("Output directory ready: {}", output_dir.display());

        let command = EnvioCommand::build(
            &config.envio.command,
            InitArgs {
                name: &params.name,
                language: params.language.as_str(),
                output_dir: &output_dir,
                contract_address,
                network,
                api_token: &params.api_token,
            },
        )?;

        let runner = TwoAttemptRunner::new(runner_settings(&config.envio));
        match runner.run(&command).await {
            RunOutcome::Succeeded { attempt, output } => {
                let mut summary = format!(
                    "Envio indexer '{}' initialized in {} ({} attempt).",
                    params.name,
                    output_dir.display(),
                    attempt
                );
                if !output.is_empty() {
                    summary.push_str("\n\n");
                    summary.push_str(&output);
                }

                let result = EnvioInitResult {
                    project_name: params.name.clone(),
                    output_directory: output_dir.to_string_lossy().into_owned(),
                    language: params.language,
                    attempt,
                    output,
                };
                Ok(structured_result(summary, &result))
            }
            RunOutcome::Failed { primary, fallback } => Err(ToolError::command_failed(
                failure_report(&params.name, &command, &primary, &fallback),
            )),
        }
    }

    /// Create the registry descriptor for this tool.
    pub fn descriptor(config: Arc<Config>) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            Self::schema(),
            Arc::new(Self::new(config)),
        )
        .with_annotations(ToolAnnotations {
            title: None,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint: Some(true),
        })
        .with_output_schema(schema_for_type::<EnvioInitResult>())
    }
}

#[async_trait::async_trait]
impl ToolHandler for EnvioInitTool {
    async fn call(&self, params: ValidatedParams) -> Result<CallToolResult, ToolError> {
        let params: EnvioInitParams = params.deserialize()?;
        Self::execute(&params, &self.config).await
    }
}

// ============================================================================
// Tests
// ============================================================================
