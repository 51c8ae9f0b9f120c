//! Prompt assembly for SQL generation.
//!
//! The model receives one flat text prompt made of fixed instructions, the
//! prior conversation, a schema description and the user's request. Model
//! output is expected to be bare SQL, but Markdown fences are removed when
//! the model adds them anyway.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Instructions placed at the top of every prompt.
pub const SYSTEM_PROMPT: &str = "You are a careful SQL assistant for SQLite databases. \
     Return only SQL code in your final answer. Do not include explanations. \
     Only produce read-only queries (SELECT or WITH ... SELECT).";

/// Placeholder used when no schema could be collected.
pub const SCHEMA_UNAVAILABLE: &str = "(schema unavailable)";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:sql)?\s*|\s*```$").expect("valid regex"));

/// One turn of the chat kept by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "default_role")]
    pub role:    String,
    #[serde(default)]
    pub content: String
}

fn default_role() -> String {
    String::from("user")
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role:    default_role(),
            content: content.into()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role:    String::from("assistant"),
            content: content.into()
        }
    }
}

/// Everything the model needs to write one query.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt:      String,
    pub schema_text: String,
    pub history:     Vec<ChatMessage>
}

/// Render chat history as `role: content` lines.
pub fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full prompt text sent to the model.
///
/// # Example
///
/// ```
/// use llm_sql_writer::prompt::{GenerationRequest, build_prompt};
///
/// let request = GenerationRequest {
///     prompt: "count rows".into(),
///     ..Default::default()
/// };
/// let text = build_prompt(&request);
/// assert!(text.contains("(schema unavailable)"));
/// assert!(text.ends_with("USER PROMPT:\ncount rows"));
/// ```
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut text = String::from(SYSTEM_PROMPT);
    let history = format_history(&request.history);
    if !history.is_empty() {
        text.push_str("\nCHAT HISTORY:\n");
        text.push_str(&history);
        text.push('\n');
    }
    text.push_str("\nSCHEMA CONTEXT:\n");
    if request.schema_text.is_empty() {
        text.push_str(SCHEMA_UNAVAILABLE);
    } else {
        text.push_str(&request.schema_text);
    }
    text.push_str("\n\nUSER PROMPT:\n");
    text.push_str(&request.prompt);
    text
}

/// Strip a surrounding ```` ```sql ```` fence from model output.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text.trim(), "").trim().to_string()
}
