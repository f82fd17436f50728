use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Categorized error types for SQLite failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorCategory {
    /// Statement could not be parsed
    Syntax,
    /// Missing table, column, index or other object
    UnknownObject,
    /// Object being created is already there
    AlreadyExists,
    /// UNIQUE / NOT NULL / CHECK / FOREIGN KEY failures
    Constraint,
    /// Database file locked by another writer
    Busy,
    /// Runtime failures not covered above
    Execution,
    /// Unknown or unclassified errors
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax Error"),
            ErrorCategory::UnknownObject => write!(f, "Unknown Object"),
            ErrorCategory::AlreadyExists => write!(f, "Already Exists"),
            ErrorCategory::Constraint => write!(f, "Constraint Violation"),
            ErrorCategory::Busy => write!(f, "Database Busy"),
            ErrorCategory::Execution => write!(f, "Execution Error"),
            ErrorCategory::Unknown => write!(f, "Error"),
        }
    }
}

/// An error reported by SQLite, with the engine's message preserved as-is.
#[derive(Debug, Clone)]
pub struct EngineError {
    pub category: ErrorCategory,
    /// Primary error message, exactly as the engine produced it
    pub message: String,
    /// Extended SQLite result code, when the failure came from the engine itself
    pub code: Option<i32>,
}

impl EngineError {
    pub fn from_sqlite(err: &rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi_err, msg) => {
                let message = msg.clone().unwrap_or_else(|| ffi_err.to_string());
                EngineError {
                    category: categorize(Some(ffi_err.code), &message),
                    message,
                    code: Some(ffi_err.extended_code),
                }
            }
            other => Self::from_message(other.to_string()),
        }
    }

    /// Build an error from a bare message (no result code available).
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        EngineError {
            category: categorize(None, &message),
            message,
            code: None,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        self.category == ErrorCategory::AlreadyExists
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Classify a failure from its primary result code and message.
///
/// Most parse and name-resolution failures share the generic `SQLITE_ERROR`
/// code, so those are told apart by message text.
fn categorize(code: Option<ErrorCode>, message: &str) -> ErrorCategory {
    match code {
        Some(ErrorCode::ConstraintViolation) => return ErrorCategory::Constraint,
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            return ErrorCategory::Busy
        }
        _ => {}
    }

    let lower = message.to_lowercase();
    if lower.contains("already exists") {
        ErrorCategory::AlreadyExists
    } else if lower.contains("syntax error") || lower.contains("incomplete input") {
        ErrorCategory::Syntax
    } else if lower.starts_with("no such ") {
        ErrorCategory::UnknownObject
    } else if lower.contains("constraint failed") {
        ErrorCategory::Constraint
    } else if code.is_some() {
        ErrorCategory::Execution
    } else {
        ErrorCategory::Unknown
    }
}

/// A single result cell, one variant per SQLite storage class.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    pub fn display(&self) -> String {
        match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Blob(b) => format!("[{} bytes]", b.len()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Integer(i) => Value::Number((*i).into()),
            // NaN and infinities have no JSON form
            CellValue::Real(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
            blob @ CellValue::Blob(_) => Value::String(blob.display()),
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

/// Turn a positional row into a column-keyed JSON object, keeping column order.
pub fn row_to_json(columns: &[String], row: &[CellValue]) -> Map<String, Value> {
    columns
        .iter()
        .zip(row)
        .map(|(name, cell)| (name.clone(), cell.to_json()))
        .collect()
}

/// Run a statement and collect its column names and every result row.
pub fn fetch_rows(
    conn: &Connection,
    sql: &str,
) -> rusqlite::Result<(Vec<String>, Vec<Vec<CellValue>>)> {
    if is_blank_sql(sql) {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query([])?;
    let mut result_rows = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            cells.push(CellValue::from(row.get_ref(i)?));
        }
        result_rows.push(cells);
    }

    Ok((columns, result_rows))
}

/// Run a statement for its side effects, stepping through and discarding any
/// rows it yields (PRAGMAs and non-terminal SELECTs produce rows too).
pub fn execute_for_effect(conn: &Connection, sql: &str) -> rusqlite::Result<()> {
    if is_blank_sql(sql) {
        return Ok(());
    }
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    while rows.next()?.is_some() {}
    Ok(())
}

/// Whether `sql` holds nothing but whitespace and comments.
///
/// SQLite prepares such text to an empty statement that cannot be stepped,
/// so callers skip it instead.
pub fn is_blank_sql(sql: &str) -> bool {
    let mut rest = sql.trim_start();
    loop {
        if rest.is_empty() {
            return true;
        }
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map(|(_, r)| r).unwrap_or("").trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, r)| r).unwrap_or("").trim_start();
        } else {
            return false;
        }
    }
}

/// Rows changed by INSERT/UPDATE/DELETE since the connection was opened.
pub fn total_changes(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT total_changes()", [], |row| row.get(0))
}
