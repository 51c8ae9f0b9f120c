use colored::Colorize;
use serde::Serialize;

use crate::guard::Verdict;

/// Output format for results
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true
        }
    }
}

/// Guard verdict for serialization
#[derive(Debug, Serialize)]
pub struct CheckResult<'a> {
    pub read_only: bool,
    #[serde(flatten)]
    pub verdict:   Verdict,
    pub sql:       &'a str
}

/// Format a guard verdict for the `check` command
pub fn format_verdict(sql: &str, verdict: &Verdict, opts: &OutputOptions) -> String {
    match opts.format {
        OutputFormat::Json => {
            let result = CheckResult {
                read_only: verdict.is_read_only(),
                verdict: *verdict,
                sql
            };
            serde_json::to_string_pretty(&result).unwrap_or_default()
        }
        OutputFormat::Text => format_text_verdict(verdict, opts.colored)
    }
}

fn format_text_verdict(verdict: &Verdict, colored: bool) -> String {
    let (label, detail) = match verdict {
        Verdict::ReadOnly {
            statements
        } => (
            "READ-ONLY",
            format!(
                "{} statement{} checked",
                statements,
                if *statements == 1 { "" } else { "s" }
            )
        ),
        Verdict::Empty => ("REJECTED", String::from("no SQL statement found")),
        Verdict::Rejected {
            statement,
            reason
        } => ("REJECTED", format!("statement {}: {}", statement, reason))
    };
    if !colored {
        return format!("{} {}", label, detail);
    }
    let label = if verdict.is_read_only() {
        label.green().bold()
    } else {
        label.red().bold()
    };
    format!("{} {}", label, detail)
}

/// Exit code for a verdict: 0 when read-only, 2 otherwise
pub fn verdict_exit_code(verdict: &Verdict) -> i32 {
    if verdict.is_read_only() { 0 } else { 2 }
}
