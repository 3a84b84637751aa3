//! Ephemeral backend - in-memory SQLite seeded with demo fixtures
//!
//! Exists so the platform can demo full CRUD flows without a server or
//! a data directory. Every process start is a fresh seed; every exit
//! loses the data. That loss is the point, not a bug.

use super::engine::Engine;
use super::{BackendKind, DataBackend, Row, RunResult, schema};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

pub struct EphemeralBackend {
    engine: Engine,
}

impl EphemeralBackend {
    pub fn new() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        schema::bootstrap(&conn)?;
        Ok(Self {
            engine: Engine::new(conn),
        })
    }
}

#[async_trait]
impl DataBackend for EphemeralBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ephemeral
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.engine.query(sql, params)
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        self.engine.run(sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.engine.query(sql, params)
    }

    async fn run_script(&self, script: &str) -> Result<()> {
        self.engine.run_script(script)
    }

    async fn export_snapshot(&self) -> Result<Vec<u8>> {
        self.engine.snapshot()
    }

    async fn import_snapshot(&self, bytes: &[u8]) -> Result<()> {
        self.engine.restore(bytes)
    }

    async fn reset_to_seed(&self) -> Result<()> {
        self.engine.rebuild_from_seed()
    }

    async fn probe(&self) -> Result<String> {
        self.engine.probe()?;
        Ok("Ephemeral database ready (in-memory, lost on exit)".to_string())
    }
}
