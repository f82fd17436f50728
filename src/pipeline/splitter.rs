use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::is_blank_sql;

/// How a batch is cut into statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitMode {
    /// Split on every `;`, including one inside a string literal.
    ///
    /// `INSERT INTO t VALUES ('a;b')` becomes two broken statements. Callers
    /// that need semicolons inside literals must opt into `QuoteAware`.
    #[default]
    Naive,
    /// Ignore `;` inside quotes and comments.
    QuoteAware,
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Naive => write!(f, "naive"),
            SplitMode::QuoteAware => write!(f, "quote-aware"),
        }
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(SplitMode::Naive),
            "quote-aware" | "quote_aware" => Ok(SplitMode::QuoteAware),
            other => Err(format!(
                "unknown split mode {:?} (expected \"naive\" or \"quote-aware\")",
                other
            )),
        }
    }
}

/// Split a batch into trimmed, non-empty statement texts, in order.
pub fn split_statements(batch: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Naive => batch
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        SplitMode::QuoteAware => statement_bounds(batch)
            .into_iter()
            .map(|(start, end)| batch[start..end].trim())
            .filter(|s| !s.is_empty() && !is_blank_sql(s))
            .map(String::from)
            .collect(),
    }
}

/// Byte ranges between top-level `;` terminators.
/// Respects single-quoted strings (with `''` escapes), double-quoted and
/// backtick identifiers, `--` line comments and `/* */` block comments.
fn statement_bounds(text: &str) -> Vec<(usize, usize)> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Quoted(char),
        LineComment,
        BlockComment,
    }

    let mut bounds = Vec::new();
    let mut state = State::Code;
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match state {
            State::Code => match c {
                '\'' | '"' | '`' => state = State::Quoted(c),
                '-' if matches!(chars.peek(), Some((_, '-'))) => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    state = State::BlockComment;
                }
                ';' => {
                    bounds.push((start, pos));
                    start = pos + 1;
                }
                _ => {}
            },
            // A doubled quote re-enters the same quoted state on the next
            // character, so escapes need no special case.
            State::Quoted(q) => {
                if c == q {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    if start < text.len() {
        bounds.push((start, text.len()));
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(batch: &str) -> Vec<String> {
        split_statements(batch, SplitMode::Naive)
    }

    fn aware(batch: &str) -> Vec<String> {
        split_statements(batch, SplitMode::QuoteAware)
    }

    #[test]
    fn test_split_two_selects() {
        assert_eq!(naive("SELECT 1; SELECT 2;"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_split_without_terminator() {
        assert_eq!(naive("  SELECT 1  "), vec!["SELECT 1"]);
    }

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(
            naive("CREATE TABLE t(x);;\n\n ;INSERT INTO t VALUES (1);  \n"),
            vec!["CREATE TABLE t(x)", "INSERT INTO t VALUES (1)"]
        );
        assert!(naive(";;;").is_empty());
    }

    #[test]
    fn test_split_keeps_order_and_inner_whitespace() {
        let stmts = naive("SELECT a,\n  b FROM t;\nDELETE FROM t");
        assert_eq!(stmts, vec!["SELECT a,\n  b FROM t", "DELETE FROM t"]);
    }

    #[test]
    fn test_naive_split_cuts_quoted_semicolon() {
        assert_eq!(
            naive("INSERT INTO t VALUES ('a;b')"),
            vec!["INSERT INTO t VALUES ('a", "b')"]
        );
    }

    #[test]
    fn test_quote_aware_respects_literals() {
        assert_eq!(
            aware("INSERT INTO t VALUES ('a;b'); SELECT * FROM t"),
            vec!["INSERT INTO t VALUES ('a;b')", "SELECT * FROM t"]
        );
        assert_eq!(
            aware("SELECT 'it''s; fine'; SELECT \"odd;name\" FROM t"),
            vec!["SELECT 'it''s; fine'", "SELECT \"odd;name\" FROM t"]
        );
    }

    #[test]
    fn test_quote_aware_respects_comments() {
        assert_eq!(
            aware("SELECT 1; -- trailing; note\nSELECT 2 /* a;b */;"),
            vec!["SELECT 1", "-- trailing; note\nSELECT 2 /* a;b */"]
        );
    }

    #[test]
    fn test_quote_aware_drops_comment_only_segments() {
        assert_eq!(aware("SELECT 1; -- done"), vec!["SELECT 1"]);
        assert_eq!(aware("/* header */ ; SELECT 1"), vec!["SELECT 1"]);
    }

    #[test]
    fn test_quote_aware_unterminated_literal_runs_to_end() {
        assert_eq!(aware("SELECT 'abc; SELECT 2"), vec!["SELECT 'abc; SELECT 2"]);
    }

    #[test]
    fn test_quote_aware_multibyte_text() {
        assert_eq!(
            aware("SELECT 'héllo'; SELECT '日本'"),
            vec!["SELECT 'héllo'", "SELECT '日本'"]
        );
    }

    #[test]
    fn test_split_mode_parse() {
        assert_eq!("naive".parse::<SplitMode>().unwrap(), SplitMode::Naive);
        assert_eq!(
            "Quote-Aware".parse::<SplitMode>().unwrap(),
            SplitMode::QuoteAware
        );
        assert!("smart".parse::<SplitMode>().is_err());
        assert_eq!(SplitMode::QuoteAware.to_string(), "quote-aware");
    }
}
