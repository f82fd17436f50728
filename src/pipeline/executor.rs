use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, Transaction};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::Statement;
use crate::db::{self, CellValue};
use crate::error::RunnerError;

static TERMINAL_READ: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*select\b").unwrap());
static CREATED_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*create\s+table\s+(?:if\s+not\s+exists\s+)?(?:`|"|\[)?([A-Za-z_][A-Za-z0-9_]*)"#,
    )
    .unwrap()
});

/// What a batch did, ready for the shaper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    /// Columns of the terminal read, if there was one
    pub columns: Vec<String>,
    /// Rows of the terminal read, positional in `columns` order
    pub rows: Vec<Vec<CellValue>>,
    pub terminal_read: bool,
    /// Last table named by a `CREATE TABLE` in the batch
    pub created_table: Option<String>,
    /// Column names of `created_table` after commit; only looked up when the
    /// batch had no terminal read. `None` if the lookup failed.
    pub created_columns: Option<Vec<String>>,
    /// Rows changed by INSERT/UPDATE/DELETE across the whole batch
    pub mutation_count: i64,
    pub elapsed: Duration,
    /// The batch hit an "already exists" error and was rolled back as a no-op
    pub already_exists: bool,
}

impl ExecutionOutcome {
    fn already_exists(elapsed: Duration) -> Self {
        Self {
            already_exists: true,
            elapsed,
            ..Default::default()
        }
    }
}

/// Whether a statement is a data-retrieval query.
pub fn is_read(sql: &str) -> bool {
    TERMINAL_READ.is_match(sql)
}

/// Name of the table a `CREATE TABLE` statement creates.
pub fn created_table_name(sql: &str) -> Option<String> {
    CREATED_TABLE
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Run every statement, in order, inside one transaction.
///
/// Commits only if all statements succeed. Any failure rolls the whole batch
/// back and is returned unchanged, except an "already exists" failure, which
/// is reported as a successful no-op. `started` marks the beginning of the
/// timed section.
pub fn execute(
    conn: &mut Connection,
    statements: &[Statement],
    started: Instant,
) -> Result<ExecutionOutcome, RunnerError> {
    let tx = conn.transaction()?;

    let mut outcome = match run_statements(&tx, statements) {
        Ok(outcome) => outcome,
        Err(RunnerError::Engine(err)) if err.is_already_exists() => {
            warn!(error = %err, "object already exists, treating batch as a no-op");
            // dropping the transaction rolls it back
            drop(tx);
            return Ok(ExecutionOutcome::already_exists(started.elapsed()));
        }
        Err(err) => return Err(err),
    };
    tx.commit()?;

    if !outcome.terminal_read {
        if let Some(table) = &outcome.created_table {
            // A table dropped later in the batch reports no columns
            outcome.created_columns = match db::table_columns(conn, table) {
                Ok(cols) => Some(cols.into_iter().map(|c| c.name).collect()),
                Err(err) => {
                    debug!(table = %table, error = %err, "created table lookup failed");
                    None
                }
            };
        }
    }

    outcome.elapsed = started.elapsed();
    Ok(outcome)
}

fn run_statements(
    tx: &Transaction<'_>,
    statements: &[Statement],
) -> Result<ExecutionOutcome, RunnerError> {
    let mut outcome = ExecutionOutcome::default();
    let before = db::total_changes(tx)?;

    for stmt in statements {
        debug!(position = stmt.position, sql = %stmt.normalized, "executing statement");

        if let Some(table) = created_table_name(&stmt.normalized) {
            outcome.created_table = Some(table);
        }

        if stmt.is_final && is_read(&stmt.normalized) {
            let (columns, rows) = db::fetch_rows(tx, &stmt.normalized)?;
            outcome.columns = columns;
            outcome.rows = rows;
            outcome.terminal_read = true;
        } else {
            db::execute_for_effect(tx, &stmt.normalized)?;
        }
    }

    outcome.mutation_count = db::total_changes(tx)? - before;
    Ok(outcome)
}
