use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::connection::{quote_ident, Database};
use super::query::{fetch_rows, row_to_json};
use crate::error::RunnerError;

/// Number of rows returned as a table preview.
pub const SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    pub columns: Vec<ColumnDescription>,
    pub sample: Vec<Map<String, Value>>,
}

/// User tables in name order; SQLite's internal `sqlite_*` tables are skipped.
pub fn list_tables(db: &Database) -> Result<Vec<String>, RunnerError> {
    let conn = db.open()?;
    let mut stmt = conn.prepare(
        r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
        ORDER BY name
        "#,
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Column definitions of `table`, in declaration order. Empty if the table
/// does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnDescription>, RunnerError> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnDescription {
                name: row.get(0)?,
                data_type: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub fn describe_table(db: &Database, table: &str) -> Result<TableDescription, RunnerError> {
    let conn = db.open()?;
    let columns = table_columns(&conn, table)?;
    if columns.is_empty() {
        return Err(RunnerError::TableNotFound(table.to_string()));
    }

    let sql = format!("SELECT * FROM {} LIMIT {}", quote_ident(table), SAMPLE_ROWS);
    let (names, rows) = fetch_rows(&conn, &sql)?;
    let sample = rows.iter().map(|row| row_to_json(&names, row)).collect();

    Ok(TableDescription { columns, sample })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("schema.db"));
        db.open()
            .unwrap()
            .execute_batch(
                "CREATE TABLE zebra (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT);
                 CREATE TABLE apple (qty REAL);
                 INSERT INTO zebra (label) VALUES ('a'), ('b'), ('c'), ('d'), ('e'), ('f'), ('g');",
            )
            .unwrap();
        (dir, db)
    }

    #[test]
    fn test_list_tables_sorted_without_internal() {
        let (_dir, db) = fixture();
        // AUTOINCREMENT creates sqlite_sequence behind the scenes
        assert_eq!(list_tables(&db).unwrap(), vec!["apple", "zebra"]);
    }

    #[test]
    fn test_list_tables_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("empty.db"));
        assert!(list_tables(&db).unwrap().is_empty());
    }

    #[test]
    fn test_describe_table_columns_and_sample() {
        let (_dir, db) = fixture();
        let desc = describe_table(&db, "zebra").unwrap();
        assert_eq!(
            desc.columns,
            vec![
                ColumnDescription {
                    name: "id".into(),
                    data_type: "INTEGER".into()
                },
                ColumnDescription {
                    name: "label".into(),
                    data_type: "TEXT".into()
                },
            ]
        );
        assert_eq!(desc.sample.len(), SAMPLE_ROWS);
        assert_eq!(desc.sample[0]["label"], "a");
    }

    #[test]
    fn test_describe_table_not_found() {
        let (_dir, db) = fixture();
        let err = describe_table(&db, "missing").unwrap_err();
        assert!(matches!(err, RunnerError::TableNotFound(ref name) if name == "missing"));
    }

    #[test]
    fn test_describe_table_name_is_not_interpolated() {
        let (_dir, db) = fixture();
        let err = describe_table(&db, "zebra); DROP TABLE zebra; --").unwrap_err();
        assert!(matches!(err, RunnerError::TableNotFound(_)));
        assert!(list_tables(&db).unwrap().contains(&"zebra".to_string()));
    }

    #[test]
    fn test_column_type_serializes_as_type() {
        let col = ColumnDescription {
            name: "id".into(),
            data_type: "INTEGER".into(),
        };
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json, serde_json::json!({"name": "id", "type": "INTEGER"}));
    }
}
