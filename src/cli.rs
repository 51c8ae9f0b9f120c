use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// LLM SQL Writer - Turn natural-language prompts into read-only SQL
#[derive(Parser, Debug)]
#[command(name = "llm-sql-writer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the generation endpoint and front-end script over HTTP
    Serve {
        /// SQLite database files, each registered under its file stem
        databases: Vec<PathBuf>,

        /// Address to bind
        #[arg(long, env = "LLM_SQL_WRITER_HOST")]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long, env = "LLM_SQL_WRITER_PORT")]
        port: Option<u16>,

        #[command(flatten)]
        llm: LlmArgs
    },

    /// Check whether SQL is read-only (exit code 0) or rejected (exit code 2)
    Check {
        /// SQL text, or - to read from stdin
        #[arg(default_value = "-")]
        sql: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    },

    /// Generate a single query for a database and print it
    Generate {
        /// SQLite database file
        #[arg(short, long)]
        db: PathBuf,

        /// What the query should do
        #[arg(long)]
        prompt: String,

        #[command(flatten)]
        llm: LlmArgs,

        /// Show the prompt that would be sent to the model without calling it
        #[arg(long)]
        dry_run: bool
    }
}

/// Model selection shared by commands that call a provider
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// LLM provider to use
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// API key for OpenAI or Anthropic
    #[arg(short, long, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama base URL
    #[arg(long)]
    pub ollama_url: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    OpenAI,
    Anthropic,
    Ollama
}

impl Provider {
    /// Get default model for provider
    pub fn default_model(&self) -> &str {
        match self {
            Self::OpenAI => "gpt-5",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::Ollama => "llama3.2"
        }
    }

    /// Parse a provider name from configuration
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true)
            .ok()
            .or_else(|| name.eq_ignore_ascii_case("openai").then_some(Self::OpenAI))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json
}
