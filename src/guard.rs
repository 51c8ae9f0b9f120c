//! Read-only SQL guard.
//!
//! A textual, non-parsing classifier that decides whether SQL text coming
//! back from a language model may be handed to the caller as a read-only
//! query. It is intentionally conservative: rejecting an oddly formatted
//! read-only query is acceptable, accepting a mutating one is not.
//!
//! # Rules
//!
//! The trimmed input is split into statements on `;` followed by optional
//! whitespace. Comments are stripped from every statement and statements
//! that end up empty are ignored. Each remaining statement must:
//!
//! 1. not begin with a keyword from [`DISALLOWED_KEYWORDS`]
//! 2. begin with `SELECT` or `WITH` (leading whitespace and opening
//!    parentheses are skipped)
//! 3. when it begins with `WITH`, reach `SELECT` as the first keyword at
//!    the outer parenthesis level after the CTE list, and contain no CTE
//!    whose body starts with a disallowed keyword
//!
//! A single failing statement rejects the whole input. Keyword matching is
//! case-insensitive and bounded by word boundaries, so `CREATETABLE` is not
//! `CREATE`.
//!
//! # Example
//!
//! ```
//! use llm_sql_writer::guard::{RejectReason, Verdict, classify, is_select_only};
//!
//! assert!(is_select_only("SELECT * FROM items"));
//! assert!(!is_select_only("SELECT 1; DROP TABLE items"));
//!
//! assert_eq!(
//!     classify("WITH cte AS (SELECT 1) DELETE FROM cte"),
//!     Verdict::Rejected {
//!         statement: 1,
//!         reason:    RejectReason::WithoutSelect
//!     }
//! );
//! ```

mod scan;

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

/// Keywords that mark a mutating or schema-altering statement.
pub const DISALLOWED_KEYWORDS: [&str; 13] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "REPLACE", "TRUNCATE", "ATTACH",
    "DETACH", "VACUUM", "ANALYZE", "PRAGMA"
];

static LEADING_READ_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[\s(]*(SELECT|WITH)\b").expect("valid regex"));

static LEADING_DISALLOWED_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^[\s(]*({})\b", DISALLOWED_KEYWORDS.join("|")))
        .expect("valid regex")
});

/// Why a statement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "keyword", rename_all = "snake_case")]
pub enum RejectReason {
    /// Statement starts with neither `SELECT` nor `WITH`
    NotSelect,
    /// `WITH` clause whose main statement is not a `SELECT`
    WithoutSelect,
    /// Statement starts with a mutating or schema-altering keyword
    DisallowedKeyword(&'static str),
    /// A CTE body starts with a mutating keyword
    ModifyingCte(&'static str)
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSelect => write!(f, "statement does not start with SELECT or WITH"),
            Self::WithoutSelect => write!(f, "WITH clause is not followed by a SELECT"),
            Self::DisallowedKeyword(keyword) => write!(f, "{} statements are not allowed", keyword),
            Self::ModifyingCte(keyword) => {
                write!(f, "common table expression performs {}", keyword)
            }
        }
    }
}

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Every non-empty statement is read-only
    ReadOnly {
        /// Number of non-empty statements checked
        statements: usize
    },
    /// Input holds no statement once comments and whitespace are removed
    Empty,
    /// A statement failed the checks
    Rejected {
        /// One-based index of the first failing statement
        statement: usize,
        reason:    RejectReason
    }
}

impl Verdict {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// True only for input with at least one statement, all read-only.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly { .. })
    }
}

/// Returns `true` when every statement in `sql` is read-only.
///
/// Input with no statements at all is vacuously read-only; callers that
/// need a query should use [`classify`] and treat [`Verdict::Empty`] as a
/// rejection.
pub fn is_select_only(sql: &str) -> bool {
    !classify(sql).is_rejected()
}

/// Classify SQL text, reporting the first failing statement.
pub fn classify(sql: &str) -> Verdict {
    let mut checked = 0;
    for raw in scan::split_statements(sql) {
        let statement = scan::strip_comments(raw);
        if statement.is_empty() {
            continue;
        }
        checked += 1;
        if let Err(reason) = check_statement(&statement) {
            return Verdict::Rejected {
                statement: checked,
                reason
            };
        }
    }
    if checked == 0 {
        Verdict::Empty
    } else {
        Verdict::ReadOnly {
            statements: checked
        }
    }
}

fn check_statement(statement: &str) -> Result<(), RejectReason> {
    if let Some(caps) = LEADING_DISALLOWED_KEYWORD.captures(statement) {
        let keyword = disallowed_keyword(&caps[1]).unwrap_or("Mutating");
        return Err(RejectReason::DisallowedKeyword(keyword));
    }
    let Some(caps) = LEADING_READ_KEYWORD.captures(statement) else {
        return Err(RejectReason::NotSelect);
    };
    if caps[1].eq_ignore_ascii_case("WITH") {
        check_with_clause(statement)?;
    }
    Ok(())
}

/// Walk a `WITH ...` statement until its main keyword.
///
/// Words at the outer level before the main statement are CTE names and
/// `AS`/`RECURSIVE`/`MATERIALIZED` modifiers; CTE bodies sit one level
/// deeper and are only inspected for a leading mutating keyword.
fn check_with_clause(statement: &str) -> Result<(), RejectReason> {
    let words = scan::words(statement);
    let Some(with) = words.iter().position(|w| w.is("WITH")) else {
        return Err(RejectReason::WithoutSelect);
    };
    let outer = words[with].depth;
    let mut previous_outer: Option<&str> = None;

    for word in &words[with + 1..] {
        if word.depth == outer {
            if word.is("SELECT") {
                return Ok(());
            }
            if disallowed_keyword(word.text).is_some() {
                return Err(RejectReason::WithoutSelect);
            }
            previous_outer = Some(word.text);
        } else if word.depth == outer + 1 && word.group_start {
            let opens_body = previous_outer.is_some_and(|w| {
                w.eq_ignore_ascii_case("AS") || w.eq_ignore_ascii_case("MATERIALIZED")
            });
            if opens_body && let Some(keyword) = disallowed_keyword(word.text) {
                return Err(RejectReason::ModifyingCte(keyword));
            }
        } else if word.depth < outer {
            break;
        }
    }
    Err(RejectReason::WithoutSelect)
}

fn disallowed_keyword(word: &str) -> Option<&'static str> {
    DISALLOWED_KEYWORDS
        .iter()
        .find(|k| k.eq_ignore_ascii_case(word))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disallowed_reported_before_not_select() {
        assert_eq!(
            check_statement("drop table items"),
            Err(RejectReason::DisallowedKeyword("DROP"))
        );
    }

    #[test]
    fn test_fused_keyword_is_not_disallowed() {
        assert_eq!(check_statement("CREATETABLE x"), Err(RejectReason::NotSelect));
    }

    #[test]
    fn test_with_column_list_is_not_a_body() {
        assert_eq!(
            check_with_clause("WITH t(replace) AS (SELECT 1) SELECT * FROM t"),
            Ok(())
        );
    }

    #[test]
    fn test_with_materialized_body() {
        assert_eq!(
            check_with_clause("WITH t AS MATERIALIZED (DELETE FROM x) SELECT 1"),
            Err(RejectReason::ModifyingCte("DELETE"))
        );
    }

    #[test]
    fn test_with_without_main_statement() {
        assert_eq!(
            check_with_clause("WITH t AS (SELECT 1)"),
            Err(RejectReason::WithoutSelect)
        );
    }
}
