//! Batch query pipeline.
//!
//! ```text
//! raw batch text
//!       ↓
//! Splitter    (splitter.rs)    ordered, trimmed statements
//!       ↓
//! Normalizer  (normalizer.rs)  per-statement dialect rewrites
//!       ↓
//! Executor    (executor.rs)    one transaction, sequential
//!       ↓
//! Shaper      (shaper.rs)      rows | created schema | mutation summary
//! ```
pub mod executor;
pub mod normalizer;
pub mod shaper;
pub mod splitter;

pub use executor::ExecutionOutcome;
pub use normalizer::normalize;
pub use shaper::{shape, ShapedResponse};
pub use splitter::{split_statements, SplitMode};

use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::db::{self, Database, TableDescription};
use crate::error::RunnerError;

/// One statement of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based position within the batch
    pub position: usize,
    pub original: String,
    pub normalized: String,
    pub is_final: bool,
}

/// Split and normalize a batch into executable statements.
pub fn prepare_statements(batch: &str, mode: SplitMode) -> Vec<Statement> {
    let texts = split_statements(batch, mode);
    let total = texts.len();
    texts
        .into_iter()
        .enumerate()
        .map(|(i, original)| Statement {
            position: i + 1,
            normalized: normalize(&original),
            original,
            is_final: i + 1 == total,
        })
        .collect()
}

/// Runs batches and introspection calls against one database.
#[derive(Debug, Clone)]
pub struct Pipeline {
    db: Database,
    split_mode: SplitMode,
}

impl Pipeline {
    pub fn new(db: Database, split_mode: SplitMode) -> Self {
        Self { db, split_mode }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run a raw multi-statement batch and shape the single response.
    #[instrument(skip_all, fields(len = raw.len()))]
    pub fn run_batch(&self, raw: &str) -> Result<ShapedResponse, RunnerError> {
        let batch = raw.trim();
        if batch.is_empty() {
            return Err(RunnerError::EmptyInput);
        }

        let started = Instant::now();
        let statements = prepare_statements(batch, self.split_mode);

        let mut conn = self.db.open()?;
        let outcome = executor::execute(&mut conn, &statements, started).map_err(|err| {
            warn!(error = %err, statements = statements.len(), "batch failed");
            err
        })?;
        drop(conn);

        let response = shape(outcome);
        info!(
            statements = statements.len(),
            elapsed_ms = response.elapsed_ms(),
            row_count = response.row_count(),
            shape = response.kind(),
            "batch committed"
        );
        Ok(response)
    }

    #[instrument(skip_all)]
    pub fn list_tables(&self) -> Result<Vec<String>, RunnerError> {
        db::list_tables(&self.db)
    }

    #[instrument(skip(self))]
    pub fn describe_table(&self, name: &str) -> Result<TableDescription, RunnerError> {
        db::describe_table(&self.db, name)
    }
}
