use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::RunnerError;

/// Handle to the single shared SQLite database file.
///
/// Holds no open connection itself. Every batch or introspection call opens
/// its own connection through [`Database::open`] and drops it when the call
/// returns, on success and failure alike.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(5000),
        }
    }

    /// How long a connection waits on another writer's lock before failing
    /// with a busy error.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<Connection, RunnerError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        debug!(path = %self.path.display(), "opened connection");
        Ok(conn)
    }
}

/// Quote an identifier for interpolation into SQL text.
/// Wraps in double quotes and doubles any embedded double quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
