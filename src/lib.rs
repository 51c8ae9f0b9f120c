//! # LLM SQL Writer Library
//!
//! Natural-language to read-only SQL for SQLite databases: prompt
//! assembly, schema introspection, LLM providers, the HTTP surface, and the
//! [`guard`] that keeps anything but `SELECT` from reaching the caller.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod guard;
pub mod llm;
pub mod output;
pub mod prompt;
pub mod schema;
pub mod server;
