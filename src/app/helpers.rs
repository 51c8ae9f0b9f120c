//! Helper functions for CLI operations.
//!
//! Reading SQL input, resolving the LLM provider from flags and
//! configuration, merging database registrations and server overrides.

use std::{
    collections::BTreeMap,
    io::{self, Read},
    path::PathBuf
};

use crate::{
    cli::{Format, LlmArgs, Provider},
    config::{LlmConfig, ServerConfig},
    error::{AppResult, config_error, file_read_error},
    llm::LlmProvider,
    output::{OutputFormat, OutputOptions},
    schema::Databases
};

/// Default Ollama endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Reads SQL from the argument itself or from stdin when it is "-".
pub fn read_sql_input(sql: &str) -> AppResult<String> {
    if sql == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        Ok(sql.to_string())
    }
}

/// Converts a CLI format to the internal output options.
pub fn create_output_options(format: Format, no_color: bool) -> OutputOptions {
    OutputOptions {
        format:  match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json
        },
        colored: !no_color
    }
}

/// Builds an LLM provider from resolved parameters.
///
/// # Errors
///
/// OpenAI and Anthropic require an API key.
///
/// # Example
///
/// ```
/// use llm_sql_writer::{app::build_llm_provider, cli::Provider};
///
/// let provider = build_llm_provider(
///     Provider::Ollama,
///     None,
///     "llama3.2".to_string(),
///     "http://localhost:11434".to_string()
/// )
/// .unwrap();
/// assert_eq!(provider.model(), "llama3.2");
///
/// assert!(build_llm_provider(Provider::OpenAI, None, "gpt-5".into(), String::new()).is_err());
/// ```
pub fn build_llm_provider(
    provider: Provider,
    api_key: Option<String>,
    model: String,
    ollama_url: String
) -> AppResult<LlmProvider> {
    match provider {
        Provider::OpenAI => {
            let key = api_key.ok_or_else(|| {
                config_error("API key required for OpenAI (use --api-key or LLM_API_KEY)")
            })?;
            Ok(LlmProvider::OpenAI {
                api_key: key,
                model
            })
        }
        Provider::Anthropic => {
            let key = api_key.ok_or_else(|| {
                config_error("API key required for Anthropic (use --api-key or LLM_API_KEY)")
            })?;
            Ok(LlmProvider::Anthropic {
                api_key: key,
                model
            })
        }
        Provider::Ollama => Ok(LlmProvider::Ollama {
            base_url: ollama_url,
            model
        })
    }
}

/// Resolves the effective provider: flags first, then configuration.
///
/// Without any provider setting, OpenAI is used.
pub fn resolve_llm_provider(args: &LlmArgs, config: &LlmConfig) -> AppResult<LlmProvider> {
    let provider = match (args.provider, config.provider.as_deref()) {
        (Some(provider), _) => provider,
        (None, Some(name)) => Provider::from_name(name)
            .ok_or_else(|| config_error(format!("Unknown LLM provider '{}'", name)))?,
        (None, None) => Provider::OpenAI
    };
    let model = args
        .model
        .clone()
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| provider.default_model().to_string());
    let ollama_url = args
        .ollama_url
        .clone()
        .or_else(|| config.ollama_url.clone())
        .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
    let api_key = args.api_key.clone().or_else(|| config.api_key.clone());
    build_llm_provider(provider, api_key, model, ollama_url)
}

/// Registers configured databases, then command-line files by file stem.
///
/// A command-line file overrides a configured database of the same name.
pub fn merge_databases(
    configured: &BTreeMap<String, PathBuf>,
    files: &[PathBuf]
) -> AppResult<Databases> {
    let mut databases = Databases::new();
    for (name, path) in configured {
        databases.insert(name.clone(), path.clone());
    }
    let from_files = Databases::from_paths(files)?;
    for name in from_files.names() {
        if let Some(path) = from_files.path(name) {
            databases.insert(name, path);
        }
    }
    Ok(databases)
}

/// Applies `--host`/`--port` on top of the configured server settings.
pub fn apply_server_overrides(
    config: &ServerConfig,
    host: Option<String>,
    port: Option<u16>
) -> ServerConfig {
    let mut server = config.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    server
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_flags() -> LlmArgs {
        LlmArgs {
            provider:   None,
            api_key:    None,
            model:      None,
            ollama_url: None
        }
    }

    #[test]
    fn test_read_sql_input_literal() {
        assert_eq!(read_sql_input("SELECT 1").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_resolve_defaults_to_openai_gpt5() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        let provider = resolve_llm_provider(&no_flags(), &config).unwrap();
        assert!(matches!(provider, LlmProvider::OpenAI { .. }));
        assert_eq!(provider.model(), "gpt-5");
    }

    #[test]
    fn test_resolve_openai_without_key_fails() {
        assert!(resolve_llm_provider(&no_flags(), &LlmConfig::default()).is_err());
    }

    #[test]
    fn test_resolve_provider_from_config_name() {
        let config = LlmConfig {
            provider: Some("ollama".to_string()),
            model: Some("sqlcoder".to_string()),
            ..LlmConfig::default()
        };
        let provider = resolve_llm_provider(&no_flags(), &config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "sqlcoder");
    }

    #[test]
    fn test_resolve_flags_override_config() {
        let args = LlmArgs {
            provider:   Some(Provider::Ollama),
            model:      Some("codellama".to_string()),
            ollama_url: Some("http://gpu:11434".to_string()),
            api_key:    None
        };
        let config = LlmConfig {
            provider: Some("anthropic".to_string()),
            ..LlmConfig::default()
        };
        match resolve_llm_provider(&args, &config).unwrap() {
            LlmProvider::Ollama {
                base_url,
                model
            } => {
                assert_eq!(base_url, "http://gpu:11434");
                assert_eq!(model, "codellama");
            }
            other => panic!("unexpected provider {:?}", other)
        }
    }

    #[test]
    fn test_resolve_unknown_provider_name() {
        let config = LlmConfig {
            provider: Some("mystery".to_string()),
            ..LlmConfig::default()
        };
        assert!(resolve_llm_provider(&no_flags(), &config).is_err());
    }

    #[test]
    fn test_merge_databases_file_overrides_config() {
        let mut configured = BTreeMap::new();
        configured.insert("shop".to_string(), PathBuf::from("/old/shop.db"));
        configured.insert("logs".to_string(), PathBuf::from("/data/logs.db"));
        let databases = merge_databases(&configured, &[PathBuf::from("/new/shop.db")]).unwrap();
        assert_eq!(databases.len(), 2);
        assert_eq!(
            databases.path("shop"),
            Some(PathBuf::from("/new/shop.db").as_path())
        );
    }

    #[test]
    fn test_apply_server_overrides() {
        let server = apply_server_overrides(&ServerConfig::default(), None, Some(9000));
        assert_eq!(server.bind_address(), "127.0.0.1:9000");
    }
}
