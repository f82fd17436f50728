use serde_json::Value;

use crate::pipeline::ShapedResponse;

pub fn to_csv(response: &ShapedResponse) -> String {
    let mut output = String::new();

    match response {
        ShapedResponse::Rows { columns, rows, .. } => {
            // Header
            let headers: Vec<String> = columns.iter().map(|c| csv_escape(c)).collect();
            output.push_str(&headers.join(","));
            output.push('\n');

            // Rows
            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| csv_escape(&value_to_csv(row.get(c).unwrap_or(&Value::Null))))
                    .collect();
                output.push_str(&cells.join(","));
                output.push('\n');
            }
        }
        ShapedResponse::Message {
            message, row_count, ..
        } => {
            output.push_str("message,rowCount\n");
            output.push_str(&format!("{},{}\n", csv_escape(message), row_count));
        }
    }

    output
}

pub fn to_json(response: &ShapedResponse) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
}

fn value_to_csv(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn make_response() -> ShapedResponse {
        let row = |v: Value| -> Map<String, Value> {
            match v {
                Value::Object(map) => map,
                _ => unreachable!(),
            }
        };
        ShapedResponse::Rows {
            columns: vec!["id".into(), "name".into(), "city".into()],
            rows: vec![
                row(json!({"id": 1, "name": "Alice", "city": "New York"})),
                row(json!({"id": 2, "name": "Bob, Jr.", "city": null})),
            ],
            row_count: 2,
            elapsed_ms: 3,
        }
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv(&make_response());
        assert_eq!(csv, "id,name,city\n1,Alice,New York\n2,\"Bob, Jr.\",\n");
    }

    #[test]
    fn test_csv_message_export() {
        let response = ShapedResponse::Message {
            message: "OK".into(),
            row_count: 4,
            elapsed_ms: 0,
        };
        assert_eq!(to_csv(&response), "message,rowCount\nOK,4\n");
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(csv_escape("hello"), "hello");
        assert_eq!(csv_escape("hello,world"), "\"hello,world\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_json_export() {
        let json = to_json(&make_response());
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["rowCount"], 2);
        assert_eq!(parsed["rows"][0]["name"], "Alice");
        assert!(parsed["rows"][1]["city"].is_null());
    }
}
