//! Command line for the external `envio init` generator.
//!
//! The command is kept as a program plus an argument vector and is spawned
//! without a shell, so user-supplied values are never interpreted. A quoted
//! display form (with the API token redacted) is used for logs and for the
//! "run it manually" hint.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::domains::tools::error::ToolError;

const REDACTED_TOKEN: &str = "<API_TOKEN>";

/// Resolved inputs for one generator run.
#[derive(Clone, Copy)]
pub struct InitArgs<'a> {
    pub name: &'a str,
    pub language: &'a str,
    pub output_dir: &'a Path,
    pub contract_address: &'a str,
    pub network: &'a str,
    pub api_token: &'a str,
}

/// A fully built generator invocation.
#[derive(Debug, Clone)]
pub struct EnvioCommand {
    program: String,
    args: Vec<String>,
    secret: String,
}

impl EnvioCommand {
    /// Build the invocation from the configured base command line.
    ///
    /// `base` is the program followed by any leading arguments, e.g.
    /// `["npx", "envio", "init"]`.
    pub fn build(base: &[String], init: InitArgs<'_>) -> Result<Self, ToolError> {
        let (program, leading) = base
            .split_first()
            .ok_or_else(|| ToolError::internal("Envio command is not configured"))?;

        let mut args: Vec<String> = leading.to_vec();
        args.extend([
            "--name".to_string(),
            init.name.to_string(),
            "--language".to_string(),
            init.language.to_string(),
            "--output-dir".to_string(),
            init.output_dir.to_string_lossy().into_owned(),
            "--contract-address".to_string(),
            init.contract_address.to_string(),
            "--network".to_string(),
            init.network.to_string(),
            "--api-token".to_string(),
            init.api_token.to_string(),
        ]);

        Ok(Self {
            program: program.clone(),
            args,
            secret: init.api_token.to_string(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// A process ready to spawn, with stdout and stderr captured.
    ///
    /// On unix the process leads a new process group so that a timed-out
    /// attempt can be killed together with its descendants.
    pub fn to_command(&self, stdin: Stdio) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        command
    }

    /// Shell-quoted command line with the API token redacted.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|arg| {
                if !self.secret.is_empty() && arg == self.secret {
                    REDACTED_TOKEN.to_string()
                } else {
                    shell_quote(arg)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Quote `arg` for a POSIX shell when it contains special characters.
fn shell_quote(arg: &str) -> String {
    let is_plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@,+%".contains(c));

    if is_plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn base() -> Vec<String> {
        vec!["npx".into(), "envio".into(), "init".into()]
    }

    fn build(output_dir: &Path) -> EnvioCommand {
        EnvioCommand::build(
            &base(),
            InitArgs {
                name: "my indexer",
                language: "typescript",
                output_dir,
                contract_address: "0xabc",
                network: "1",
                api_token: "secret-token",
            },
        )
        .unwrap()
    }

    #[test]
    fn test_build_flags_in_order() {
        let dir = PathBuf::from("/tmp/envio/demo");
        let command = build(&dir);

        assert_eq!(command.program(), "npx");
        assert_eq!(
            command.args(),
            &[
                "envio",
                "init",
                "--name",
                "my indexer",
                "--language",
                "typescript",
                "--output-dir",
                "/tmp/envio/demo",
                "--contract-address",
                "0xabc",
                "--network",
                "1",
                "--api-token",
                "secret-token",
            ]
        );
    }

    #[test]
    fn test_display_redacts_token_and_quotes() {
        let dir = PathBuf::from("/tmp/envio/demo");
        let display = build(&dir).display();

        assert!(!display.contains("secret-token"));
        assert!(display.contains("--api-token <API_TOKEN>"));
        assert!(display.contains("--name 'my indexer'"));
        assert!(display.starts_with("npx envio init"));
    }

    #[test]
    fn test_empty_base_command() {
        let dir = PathBuf::from("/tmp");
        let result = EnvioCommand::build(
            &[],
            InitArgs {
                name: "x",
                language: "typescript",
                output_dir: &dir,
                contract_address: "0x1",
                network: "1",
                api_token: "t",
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain-arg"), "plain-arg");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
