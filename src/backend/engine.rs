//! Shared plumbing for the local SQLite engines
//!
//! Statements arrive as text with JSON parameters and leave as JSON row
//! maps, so the embedded and ephemeral backends stay interchangeable
//! with the remote API. BLOB columns are surfaced as base64 strings to
//! match the wire representation of `resources.file_blob`.

use crate::{Error, Result, Row, RunResult};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A SQLite connection behind a lock, shared by the embedded and
/// ephemeral backends. Critical sections never hold the lock across an
/// await point.
pub(crate) struct Engine {
    conn: Mutex<Connection>,
}

impl Engine {
    pub(crate) fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// A poisoned lock only means a panic mid-statement; the connection
    /// itself is still usable, so recover rather than propagate.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        fetch_rows(&self.lock(), sql, params)
    }

    pub(crate) fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql).map_err(statement_error)?;
        bind_params(&mut stmt, params)?;
        let changes = stmt.raw_execute().map_err(statement_error)?;
        drop(stmt);
        let rowid = conn.last_insert_rowid();
        Ok(RunResult {
            last_insert_id: (rowid != 0).then_some(rowid),
            changes: changes as u64,
        })
    }

    /// Sequential batch; the first failing statement aborts the rest.
    /// Already-applied statements stay applied (no rollback).
    pub(crate) fn run_script(&self, script: &str) -> Result<()> {
        let conn = self.lock();
        for stmt in split_statements(script) {
            conn.execute_batch(stmt).map_err(statement_error)?;
        }
        Ok(())
    }

    pub(crate) fn probe(&self) -> Result<()> {
        self.lock()
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(statement_error)
    }

    /// Serialize the full current state by backing the live database up
    /// into a scratch file and reading it back.
    pub(crate) fn snapshot(&self) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("snapshot.db");
        {
            let conn = self.lock();
            let mut dst = Connection::open(&target)?;
            let backup = rusqlite::backup::Backup::new(&conn, &mut dst)?;
            backup.run_to_completion(512, Duration::ZERO, None)?;
        }
        Ok(std::fs::read(&target)?)
    }

    /// Replace the full current state with a previously exported image.
    /// The live connection keeps its identity (and, for the embedded
    /// engine, its on-disk file).
    pub(crate) fn restore(&self, bytes: &[u8]) -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("import.db");
        std::fs::write(&source, bytes)?;
        let src = Connection::open(&source)?;
        // Reject garbage before it replaces live data.
        src.query_row("SELECT COUNT(*) FROM sqlite_master", [], |_| Ok(()))
            .map_err(|e| Error::Statement(format!("snapshot rejected: {}", e)))?;
        let mut conn = self.lock();
        let backup = rusqlite::backup::Backup::new(&src, &mut conn)?;
        backup.run_to_completion(512, Duration::ZERO, None)?;
        Ok(())
    }

    /// Throw away current state and rebuild from schema + seed.
    pub(crate) fn rebuild_from_seed(&self) -> Result<()> {
        let fresh = Connection::open_in_memory()?;
        super::schema::bootstrap(&fresh)?;
        let mut conn = self.lock();
        let backup = rusqlite::backup::Backup::new(&fresh, &mut conn)?;
        backup.run_to_completion(512, Duration::ZERO, None)?;
        Ok(())
    }
}

/// Run a statement and collect every result row as a JSON map.
pub(crate) fn fetch_rows(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql).map_err(statement_error)?;
    bind_params(&mut stmt, params)?;
    let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next().map_err(statement_error)? {
        let mut map = Row::new();
        for (i, name) in names.iter().enumerate() {
            let value = row.get_ref(i).map_err(statement_error)?;
            map.insert(name.clone(), column_to_json(value));
        }
        out.push(map);
    }
    Ok(out)
}

fn bind_params(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> Result<()> {
    for (i, value) in params.iter().enumerate() {
        let idx = i + 1;
        let bound = match value {
            Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null),
            Value::Bool(b) => stmt.raw_bind_parameter(idx, *b),
            Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    stmt.raw_bind_parameter(idx, int)
                } else {
                    stmt.raw_bind_parameter(idx, n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => stmt.raw_bind_parameter(idx, s.as_str()),
            // Arrays/objects have no SQL shape; store their JSON text.
            other => stmt.raw_bind_parameter(idx, other.to_string()),
        };
        bound.map_err(statement_error)?;
    }
    Ok(())
}

fn column_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(BASE64.encode(b)),
    }
}

/// Split a script on statement terminators, dropping blank fragments.
/// Matches the original bootstrap loader: terminators inside string
/// literals are not handled, and the fixed schema/seed text avoids them.
pub(crate) fn split_statements(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
}

fn statement_error(err: rusqlite::Error) -> Error {
    Error::Statement(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded_engine() -> Engine {
        let conn = Connection::open_in_memory().unwrap();
        crate::backend::schema::bootstrap(&conn).unwrap();
        Engine::new(conn)
    }

    #[test]
    fn test_query_returns_json_rows() {
        let engine = seeded_engine();
        let rows = engine
            .query("SELECT id, name FROM sectors ORDER BY name ASC", &[])
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["name"], json!("AgroBank"));
        assert_eq!(rows[0]["id"], json!(1));
    }

    #[test]
    fn test_run_reports_changes_and_rowid() {
        let engine = seeded_engine();
        let result = engine
            .run(
                "INSERT INTO sectors (name, type) VALUES (?1, ?2)",
                &[json!("Test Co"), json!("Finance")],
            )
            .unwrap();
        assert_eq!(result.changes, 1);
        assert_eq!(result.last_insert_id, Some(4));
    }

    #[test]
    fn test_run_zero_changes_delete() {
        let engine = seeded_engine();
        let result = engine
            .run("DELETE FROM sectors WHERE id = ?1", &[json!(9999)])
            .unwrap();
        assert_eq!(result.changes, 0);
    }

    #[test]
    fn test_malformed_statement_surfaces_message() {
        let engine = seeded_engine();
        let err = engine.query("SELEC nonsense", &[]).unwrap_err();
        assert!(matches!(err, Error::Statement(_)));
    }

    #[test]
    fn test_script_aborts_on_first_failure() {
        let engine = seeded_engine();
        let script = r#"
            INSERT INTO sectors (name, type) VALUES ('First', 'Finance');
            INSERT INTO missing_table (x) VALUES (1);
            INSERT INTO sectors (name, type) VALUES ('Never', 'Finance')
        "#;
        assert!(engine.run_script(script).is_err());

        // The first statement stays applied, the one after the failure
        // never runs.
        let rows = engine
            .query("SELECT name FROM sectors WHERE name IN ('First', 'Never')", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("First"));
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let engine = seeded_engine();
        engine
            .run(
                "INSERT INTO sectors (name, type) VALUES (?1, ?2)",
                &[json!("Snapshot Co"), json!("Finance")],
            )
            .unwrap();
        let image = engine.snapshot().unwrap();
        assert!(!image.is_empty());

        engine
            .run("DELETE FROM sectors WHERE name = ?1", &[json!("Snapshot Co")])
            .unwrap();
        engine.restore(&image).unwrap();

        let rows = engine
            .query("SELECT id FROM sectors WHERE name = ?1", &[json!("Snapshot Co")])
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let engine = seeded_engine();
        assert!(engine.restore(b"not a database image").is_err());
    }

    #[test]
    fn test_rebuild_from_seed() {
        let engine = seeded_engine();
        engine
            .run("DELETE FROM sectors", &[])
            .unwrap();
        engine.rebuild_from_seed().unwrap();
        let rows = engine.query("SELECT id FROM sectors", &[]).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_blob_columns_surface_as_base64() {
        let engine = seeded_engine();
        engine
            .run(
                "UPDATE resources SET file_blob = x'DEADBEEF' WHERE id = 2",
                &[],
            )
            .unwrap();
        let rows = engine
            .query("SELECT file_blob FROM resources WHERE id = 2", &[])
            .unwrap();
        assert_eq!(rows[0]["file_blob"], json!("3q2+7w=="));
    }
}
