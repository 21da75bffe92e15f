/*!
 * External tool invocation.
 *
 * The extractor and the encoder are opaque binaries: they get an argument
 * list, run to completion, and are judged by the files they leave behind.
 * The `ToolRunner` trait is the seam the controller drives them through.
 */

use async_trait::async_trait;
use log::{debug, info};
use std::fmt::Debug;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::errors::PipelineError;

/// Result of one tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExit {
    /// Exit code, when the platform reports one
    pub code: Option<i32>,
}

/// Runs an external tool to completion
#[async_trait]
pub trait ToolRunner: Send + Sync + Debug {
    /// Run `program` with `args` and wait for it to exit.
    ///
    /// Only a failure to start is an error; the exit code is informational.
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolExit, PipelineError>;
}

/// Runs tools as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Inherit stdout/stderr instead of discarding them
    pub show_output: bool,
    /// Log each command line before running it
    pub echo_commands: bool,
}

impl ProcessRunner {
    pub fn new(show_output: bool, echo_commands: bool) -> Self {
        Self { show_output, echo_commands }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolExit, PipelineError> {
        if self.echo_commands {
            info!("--> {}", display_command(program, args));
        } else {
            debug!("Running {}", display_command(program, args));
        }

        let (stdout, stderr) = if self.show_output {
            (Stdio::inherit(), Stdio::inherit())
        } else {
            (Stdio::null(), Stdio::null())
        };

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await
            .map_err(|e| PipelineError::SubprocessFailure {
                tool: tool_name(program),
                detail: e.to_string(),
            })?;

        debug!("{} exited with {:?}", tool_name(program), status.code());
        Ok(ToolExit { code: status.code() })
    }
}

/// Command line as a copy-pasteable string
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![quote_if_needed(program)];
    parts.extend(args.iter().map(|arg| quote_if_needed(arg)));
    parts.join(" ")
}

fn quote_if_needed(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// File name of a tool path, for messages
pub fn tool_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| program.to_string())
}
