//! Application logic for the llm-sql-writer CLI.
//!
//! This module contains the command runners separated from the main
//! entry point to enable testing.

mod helpers;
mod types;

use std::{sync::Arc, time::Duration};

pub use helpers::{
    DEFAULT_OLLAMA_URL, apply_server_overrides, build_llm_provider, create_output_options,
    merge_databases, read_sql_input, resolve_llm_provider
};
use indicatif::{ProgressBar, ProgressStyle};
pub use types::{CheckParams, CommandOutput, GenerateParams, ServeParams};

use crate::{
    config::Config,
    error::{AppResult, config_error},
    guard::{Verdict, classify},
    llm::{LlmClient, SqlGenerator},
    output::{format_verdict, verdict_exit_code},
    prompt::{GenerationRequest, build_prompt},
    schema::{Databases, collect_schema},
    server::{self, AppState, READ_ONLY_ERROR}
};

/// Run the check command
pub fn run_check(params: CheckParams) -> AppResult<CommandOutput> {
    let sql = read_sql_input(&params.sql)?;
    let verdict = classify(&sql);
    let opts = create_output_options(params.output_format, params.no_color);
    Ok(CommandOutput {
        exit_code: verdict_exit_code(&verdict),
        stdout:    vec![format_verdict(&sql, &verdict, &opts)],
        stderr:    Vec::new()
    })
}

/// Run the serve command until the server stops
pub async fn run_serve(params: ServeParams, config: Config) -> AppResult<()> {
    let databases = merge_databases(&config.databases, &params.databases)?;
    if databases.is_empty() {
        return Err(config_error(
            "No databases to serve (pass SQLite files or add a [databases] section)"
        ));
    }
    let provider = resolve_llm_provider(&params.llm, &config.llm)?;
    log::info!("Using {} model {}", provider.name(), provider.model());

    let server_config = apply_server_overrides(&config.server, params.host, params.port);
    let generator = Arc::new(LlmClient::with_retry_config(provider, config.retry));
    let state = Arc::new(AppState::new(databases, generator));
    server::serve(state, &server_config).await
}

/// Run the generate command
pub async fn run_generate(params: GenerateParams, config: Config) -> AppResult<CommandOutput> {
    let prompt = params.prompt.trim();
    if prompt.is_empty() {
        return Err(config_error("Prompt must not be empty"));
    }
    let databases = Databases::from_paths([&params.db])?;
    let Some(name) = databases.names().next().map(str::to_string) else {
        return Err(config_error("No database given"));
    };
    let request = GenerationRequest {
        prompt:      prompt.to_string(),
        schema_text: collect_schema(&databases, &name).await,
        history:     Vec::new()
    };

    if params.dry_run {
        return Ok(CommandOutput {
            exit_code: 0,
            stdout:    vec![
                String::from("=== DRY RUN - Would send to LLM ===\n"),
                build_prompt(&request),
            ],
            stderr:    Vec::new()
        });
    }

    let provider = resolve_llm_provider(&params.llm, &config.llm)?;
    let client = LlmClient::with_retry_config(provider, config.retry);

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Generating SQL with LLM...");
    pb.enable_steady_tick(Duration::from_millis(100));
    let result = client.generate_sql(&request).await;
    pb.finish_and_clear();
    let sql = result?;

    Ok(generated_output(sql))
}

/// Route generated SQL to stdout when read-only, to stderr otherwise
fn generated_output(sql: String) -> CommandOutput {
    let verdict = classify(&sql);
    match verdict {
        Verdict::ReadOnly {
            ..
        } => CommandOutput {
            exit_code: 0,
            stdout:    vec![sql],
            stderr:    Vec::new()
        },
        Verdict::Empty => CommandOutput {
            exit_code: 2,
            stdout:    Vec::new(),
            stderr:    vec![String::from("Model returned no SQL")]
        },
        Verdict::Rejected {
            statement,
            reason
        } => CommandOutput {
            exit_code: 2,
            stdout:    Vec::new(),
            stderr:    vec![
                format!("{} (statement {}: {})", READ_ONLY_ERROR, statement, reason),
                sql,
            ]
        }
    }
}
