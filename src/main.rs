//! # LLM SQL Writer
//!
//! Turn natural-language prompts into read-only SQL for SQLite databases.
//!
//! `llm-sql-writer` serves a JSON endpoint that sends a prompt, the chat
//! history and a description of the target database's schema to a large
//! language model, then checks the returned SQL with a conservative
//! read-only guard before handing it back. A small front-end script adds a
//! chat panel above a page's SQL editor and fills the editor with the
//! generated query.
//!
//! # Quick Start
//!
//! ```bash
//! # Serve two databases on http://127.0.0.1:8001
//! export LLM_API_KEY="sk-..."
//! llm-sql-writer serve shop.db logs.db
//!
//! # Ask for a query directly
//! llm-sql-writer generate --db shop.db --prompt "ten most expensive items"
//!
//! # Check SQL against the read-only guard (exit code 0 or 2)
//! echo "DELETE FROM items" | llm-sql-writer check -
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/-/llm-sql-writer/generate` | `{db, table, prompt, history}` -> `{sql}` or `{error}` |
//! | GET | `/-/static-plugins/llm_sql_writer/app.js` | Front-end chat panel |
//! | GET | `/{db}/{table}` | Table page with SQL editor and injected script |
//! | GET | `/health` | Health check |
//!
//! # Read-Only Guard
//!
//! Generated SQL is split into statements; every statement must start with
//! `SELECT`, or with `WITH` followed by a `SELECT` main statement, and none
//! may start with `INSERT`, `UPDATE`, `DELETE`, `DROP`, `ALTER`, `CREATE`,
//! `REPLACE`, `TRUNCATE`, `ATTACH`, `DETACH`, `VACUUM`, `ANALYZE` or
//! `PRAGMA`. Rejected SQL yields HTTP 400 with
//! `"Only read-only SELECT queries are allowed"`.
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`LLM_API_KEY`, `LLM_PROVIDER`, etc.)
//! 3. `.llm-sql-writer.toml` in current directory
//! 4. `~/.config/llm-sql-writer/config.toml`
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for detail.
//!
//! # Exit Codes
//!
//! - `0` - Success / SQL is read-only
//! - `1` - Error
//! - `2` - SQL rejected by the guard

use std::process;

use clap::Parser;
use llm_sql_writer::{
    app::{
        CheckParams, CommandOutput, GenerateParams, ServeParams, run_check, run_generate,
        run_serve
    },
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tokio::main;

#[main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run().await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run() -> AppResult<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            databases,
            host,
            port,
            llm
        } => {
            let config = Config::load()?;
            run_serve(
                ServeParams {
                    databases,
                    host,
                    port,
                    llm
                },
                config
            )
            .await?;
            Ok(0)
        }
        Commands::Check {
            sql,
            output_format,
            no_color
        } => {
            let output = run_check(CheckParams {
                sql,
                output_format,
                no_color
            })?;
            Ok(print_output(output))
        }
        Commands::Generate {
            db,
            prompt,
            llm,
            dry_run
        } => {
            let config = Config::load()?;
            let output = run_generate(
                GenerateParams {
                    db,
                    prompt,
                    llm,
                    dry_run
                },
                config
            )
            .await?;
            Ok(print_output(output))
        }
    }
}

fn print_output(output: CommandOutput) -> i32 {
    for line in &output.stdout {
        println!("{}", line);
    }
    for line in &output.stderr {
        eprintln!("{}", line);
    }
    output.exit_code
}
