//! Application types for CLI commands.
//!
//! Parameters carried from the parsed command line into the command
//! runners, and the outputs the runners hand back to `main`.

use std::path::PathBuf;

use crate::cli::{Format, LlmArgs};

/// Parameters for the serve command.
#[derive(Debug, Clone)]
pub struct ServeParams {
    /// Database files given on the command line.
    pub databases: Vec<PathBuf>,
    /// Bind address override.
    pub host:      Option<String>,
    /// Bind port override.
    pub port:      Option<u16>,
    /// Model selection.
    pub llm:       LlmArgs
}

/// Parameters for the check command.
///
/// # Example
///
/// ```
/// use llm_sql_writer::{app::CheckParams, cli::Format};
///
/// let params = CheckParams {
///     sql:           "SELECT 1".to_string(),
///     output_format: Format::Text,
///     no_color:      true
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CheckParams {
    /// SQL text, or "-" for stdin input.
    pub sql:           String,
    /// Output format for the verdict.
    pub output_format: Format,
    /// Disable colored terminal output.
    pub no_color:      bool
}

/// Parameters for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    /// SQLite database file to describe to the model.
    pub db:      PathBuf,
    /// Natural-language request.
    pub prompt:  String,
    /// Model selection.
    pub llm:     LlmArgs,
    /// Print the prompt instead of calling the model.
    pub dry_run: bool
}

/// Output from CLI command execution.
///
/// ```
/// use llm_sql_writer::app::CommandOutput;
///
/// let output = CommandOutput {
///     exit_code: 0,
///     stdout:    vec!["SELECT 1".to_string()],
///     stderr:    vec![]
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code for the process (0=read-only, 2=rejected).
    pub exit_code: i32,
    /// Lines to print to stdout.
    pub stdout:    Vec<String>,
    /// Lines to print to stderr.
    pub stderr:    Vec<String>
}
