use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::executor::ExecutionOutcome;
use crate::db::row_to_json;

pub const OK_MESSAGE: &str = "OK";
pub const ALREADY_EXISTS_MESSAGE: &str = "OK (table already exists)";

/// The single response produced for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapedResponse {
    /// A terminal read, or the schema of a freshly created table (no rows).
    #[serde(rename_all = "camelCase")]
    Rows {
        columns: Vec<String>,
        rows: Vec<Map<String, Value>>,
        row_count: usize,
        elapsed_ms: u64,
    },
    /// A pure mutation summary.
    #[serde(rename_all = "camelCase")]
    Message {
        message: String,
        row_count: u64,
        elapsed_ms: u64,
    },
}

impl ShapedResponse {
    pub fn row_count(&self) -> u64 {
        match self {
            ShapedResponse::Rows { row_count, .. } => *row_count as u64,
            ShapedResponse::Message { row_count, .. } => *row_count,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self {
            ShapedResponse::Rows { elapsed_ms, .. } | ShapedResponse::Message { elapsed_ms, .. } => {
                *elapsed_ms
            }
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ShapedResponse::Rows { .. } => "rows",
            ShapedResponse::Message { .. } => "message",
        }
    }
}

/// Pick the response shape for an outcome.
///
/// Priority: terminal read, then created-table schema, then mutation summary.
pub fn shape(outcome: ExecutionOutcome) -> ShapedResponse {
    let elapsed_ms = outcome.elapsed.as_millis() as u64;

    if outcome.already_exists {
        return ShapedResponse::Message {
            message: ALREADY_EXISTS_MESSAGE.to_string(),
            row_count: 0,
            elapsed_ms,
        };
    }

    if outcome.terminal_read {
        let rows: Vec<Map<String, Value>> = outcome
            .rows
            .iter()
            .map(|row| row_to_json(&outcome.columns, row))
            .collect();
        return ShapedResponse::Rows {
            row_count: rows.len(),
            columns: outcome.columns,
            rows,
            elapsed_ms,
        };
    }

    if let (Some(_), Some(columns)) = (&outcome.created_table, outcome.created_columns) {
        return ShapedResponse::Rows {
            columns,
            rows: Vec::new(),
            row_count: 0,
            elapsed_ms,
        };
    }

    ShapedResponse::Message {
        message: OK_MESSAGE.to_string(),
        row_count: outcome.mutation_count.max(0) as u64,
        elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CellValue;
    use serde_json::json;
    use std::time::Duration;

    fn read_outcome() -> ExecutionOutcome {
        ExecutionOutcome {
            columns: vec!["id".into(), "name".into()],
            rows: vec![
                vec![CellValue::Integer(1), CellValue::Text("Alice".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ],
            terminal_read: true,
            elapsed: Duration::from_millis(12),
            ..Default::default()
        }
    }

    #[test]
    fn test_terminal_read_shape() {
        let response = shape(read_outcome());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "columns": ["id", "name"],
                "rows": [{"id": 1, "name": "Alice"}, {"id": 2, "name": null}],
                "rowCount": 2,
                "elapsedMs": 12
            })
        );
    }

    #[test]
    fn test_terminal_read_wins_over_created_table() {
        let outcome = ExecutionOutcome {
            columns: vec!["x".into()],
            terminal_read: true,
            created_table: Some("t".into()),
            created_columns: Some(vec!["x".into(), "y".into()]),
            ..Default::default()
        };
        match shape(outcome) {
            ShapedResponse::Rows {
                columns, row_count, ..
            } => {
                assert_eq!(columns, vec!["x"]);
                assert_eq!(row_count, 0);
            }
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[test]
    fn test_created_table_shape() {
        let outcome = ExecutionOutcome {
            created_table: Some("t".into()),
            created_columns: Some(vec!["a".into(), "b".into()]),
            mutation_count: 4,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(shape(outcome)).unwrap(),
            json!({"columns": ["a", "b"], "rows": [], "rowCount": 0, "elapsedMs": 0})
        );
    }

    #[test]
    fn test_created_table_without_columns_keeps_schema_shape() {
        let outcome = ExecutionOutcome {
            created_table: Some("gone".into()),
            created_columns: Some(Vec::new()),
            mutation_count: 2,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(shape(outcome)).unwrap(),
            json!({"columns": [], "rows": [], "rowCount": 0, "elapsedMs": 0})
        );
    }

    #[test]
    fn test_failed_schema_lookup_falls_back() {
        let outcome = ExecutionOutcome {
            created_table: Some("t".into()),
            created_columns: None,
            mutation_count: 2,
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(shape(outcome)).unwrap(),
            json!({"message": "OK", "rowCount": 2, "elapsedMs": 0})
        );
    }

    #[test]
    fn test_mutation_shape() {
        let outcome = ExecutionOutcome {
            mutation_count: 3,
            elapsed: Duration::from_millis(5),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(shape(outcome)).unwrap(),
            json!({"message": "OK", "rowCount": 3, "elapsedMs": 5})
        );
    }

    #[test]
    fn test_negative_mutation_count_clamped() {
        let outcome = ExecutionOutcome {
            mutation_count: -2,
            ..Default::default()
        };
        assert_eq!(shape(outcome).row_count(), 0);
    }

    #[test]
    fn test_already_exists_shape() {
        let response = shape(ExecutionOutcome {
            already_exists: true,
            elapsed: Duration::from_millis(1),
            ..Default::default()
        });
        assert_eq!(
            response,
            ShapedResponse::Message {
                message: ALREADY_EXISTS_MESSAGE.into(),
                row_count: 0,
                elapsed_ms: 1,
            }
        );
    }

    #[test]
    fn test_response_deserializes_both_shapes() {
        let rows: ShapedResponse =
            serde_json::from_value(json!({"columns": [], "rows": [], "rowCount": 0, "elapsedMs": 0}))
                .unwrap();
        assert_eq!(rows.kind(), "rows");
        let msg: ShapedResponse =
            serde_json::from_value(json!({"message": "OK", "rowCount": 1, "elapsedMs": 2})).unwrap();
        assert_eq!(msg.row_count(), 1);
        assert_eq!(msg.elapsed_ms(), 2);
    }
}
