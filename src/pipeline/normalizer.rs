//! Textual rewrites from MySQL/PostgreSQL-flavoured DDL into SQLite's dialect.
//!
//! Every rewrite is anchored either at the start of the statement or on whole
//! words, is case-insensitive, and leaves already-normalized text alone, so
//! running [`normalize`] twice gives the same text as running it once.
//! Quoted text (`'literals'`, `"identifiers"`, `` `identifiers` ``) is never
//! touched by the type rewrites.

use once_cell::sync::Lazy;
use regex::Regex;

static CREATE_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\s*create\s+table)\s+").unwrap());
static CREATE_TABLE_GUARDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*create\s+table\s+if\s+not\s+exists\b").unwrap());
static DROP_TABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(\s*drop\s+table)\s+").unwrap());
static DROP_TABLE_GUARDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*drop\s+table\s+if\s+exists\b").unwrap());

/// Type and keyword rewrites, applied in this order.
static TYPE_REWRITES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)\bAUTO_INCREMENT\b", "AUTOINCREMENT"),
        (
            r"(?i)\bINT\s+PRIMARY\s+KEY\s+AUTOINCREMENT\b",
            "INTEGER PRIMARY KEY AUTOINCREMENT",
        ),
        (r"(?i)\bVARCHAR\s*\(\s*\d+\s*\)", "TEXT"),
        (r"(?i)\bCHAR\s*\(\s*\d+\s*\)", "TEXT"),
        (r"(?i)\b(?:TINY|SMALL|MEDIUM|BIG)INT\b", "INTEGER"),
        (r"(?i)\b(?:DOUBLE|FLOAT)\b", "REAL"),
        (r"(?i)\b(?:DATETIME|TIMESTAMP)\b", "TEXT"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

/// Rewrite one statement into SQLite's dialect.
pub fn normalize(statement: &str) -> String {
    let guarded = add_existence_guard(statement);
    map_unquoted(&guarded, rewrite_types)
}

/// `CREATE TABLE x` → `CREATE TABLE IF NOT EXISTS x`,
/// `DROP TABLE x` → `DROP TABLE IF EXISTS x`.
fn add_existence_guard(statement: &str) -> String {
    if CREATE_TABLE.is_match(statement) && !CREATE_TABLE_GUARDED.is_match(statement) {
        return CREATE_TABLE
            .replace(statement, "$1 IF NOT EXISTS ")
            .into_owned();
    }
    if DROP_TABLE.is_match(statement) && !DROP_TABLE_GUARDED.is_match(statement) {
        return DROP_TABLE.replace(statement, "$1 IF EXISTS ").into_owned();
    }
    statement.to_string()
}

fn rewrite_types(code: &str) -> String {
    TYPE_REWRITES
        .iter()
        .fold(code.to_string(), |acc, (pattern, replacement)| {
            pattern.replace_all(&acc, *replacement).into_owned()
        })
}

/// Apply `rewrite` to the parts of `sql` outside quotes, copying quoted
/// parts through verbatim. An unterminated quote runs to the end of input.
fn map_unquoted(sql: &str, rewrite: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut code_start = 0;
    let mut chars = sql.char_indices();

    while let Some((pos, c)) = chars.next() {
        if !matches!(c, '\'' | '"' | '`') {
            continue;
        }
        out.push_str(&rewrite(&sql[code_start..pos]));
        let close = chars
            .by_ref()
            .find(|&(_, q)| q == c)
            .map(|(end, q)| end + q.len_utf8())
            .unwrap_or(sql.len());
        out.push_str(&sql[pos..close]);
        code_start = close;
    }

    out.push_str(&rewrite(&sql[code_start..]));
    out
}
