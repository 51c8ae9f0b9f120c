//! Lexical helpers for the guard: statement splitting, comment stripping
//! and a word scanner that tracks parenthesis depth.

use std::sync::LazyLock;

use regex::Regex;

/// Semicolon followed by any amount of whitespace.
static STATEMENT_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r";\s*").expect("valid regex"));

/// Whole lines whose first non-blank characters are `--`.
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*--.*$").expect("valid regex"));

/// Non-greedy block comment, may span lines.
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

/// Split trimmed SQL text into raw statements.
///
/// Purely textual: semicolons inside string literals split too.
pub fn split_statements(sql: &str) -> impl Iterator<Item = &str> {
    STATEMENT_SEPARATOR.split(sql.trim())
}

/// Remove full-line `--` comments and `/* ... */` block comments, then trim.
///
/// Block comments are replaced by a single space so that tokens on either
/// side never fuse into a new keyword.
pub fn strip_comments(statement: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(statement, "");
    BLOCK_COMMENT
        .replace_all(&without_lines, " ")
        .trim()
        .to_string()
}

/// A bare word found by [`words`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word<'a> {
    pub text:        &'a str,
    /// Parenthesis depth at which the word appears
    pub depth:       usize,
    /// Word is the first token after an opening parenthesis
    pub group_start: bool
}

impl Word<'_> {
    pub fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Collect bare words (`[A-Za-z0-9_]+`) with their parenthesis depth.
///
/// String literals and quoted identifiers (`'..'`, `".."`, `` `..` ``,
/// `[..]`) are skipped, as are `--` comments up to the end of the line.
/// An unterminated quote swallows the rest of the text.
/// Unbalanced closing parentheses never take the depth below zero.
pub fn words(statement: &str) -> Vec<Word<'_>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut group_start = false;
    let mut chars = statement.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '\'' | '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                for (_, next) in chars.by_ref() {
                    if next == close {
                        break;
                    }
                }
                group_start = false;
            }
            '-' if chars.peek().is_some_and(|&(_, next)| next == '-') => {
                for (_, next) in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                depth += 1;
                group_start = true;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                group_start = false;
            }
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    end = idx + next.len_utf8();
                    chars.next();
                }
                out.push(Word {
                    text: &statement[start..end],
                    depth,
                    group_start
                });
                group_start = false;
            }
            c if c.is_whitespace() => {}
            _ => group_start = false
        }
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
