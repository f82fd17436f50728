use tracing::info;

use super::connection::Database;
use crate::error::RunnerError;

const DEMO_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Customers (
  CustomerID INTEGER PRIMARY KEY AUTOINCREMENT,
  Name TEXT NOT NULL,
  Email TEXT,
  City TEXT
);
"#;

const DEMO_CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Alice", "alice@example.com", "New York"),
    ("Bob", "bob@example.com", "San Francisco"),
    ("Charlie", "charlie@example.com", "Chicago"),
];

/// Create the demo `Customers` table and seed it when empty.
///
/// Safe to run repeatedly; returns the number of rows seeded (0 when the
/// table already had data).
pub fn bootstrap_demo_schema(db: &Database) -> Result<usize, RunnerError> {
    let mut conn = db.open()?;
    let tx = conn.transaction()?;
    tx.execute_batch(DEMO_SCHEMA)?;

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM Customers", [], |row| row.get(0))?;
    let mut seeded = 0;
    if existing == 0 {
        let mut insert = tx.prepare("INSERT INTO Customers (Name, Email, City) VALUES (?1, ?2, ?3)")?;
        for (name, email, city) in DEMO_CUSTOMERS {
            seeded += insert.execute([name, email, city])?;
        }
    }
    tx.commit()?;

    info!(path = %db.path().display(), seeded, "database initialized");
    Ok(seeded)
}
