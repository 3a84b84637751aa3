//! Embedded backend - file-backed SQLite under the data directory
//!
//! The local analogue of the hosted database: state survives restarts
//! in a single database file. Schema and seed rows are bootstrapped the
//! first time the file is created (the users table is the sentinel).

use super::engine::Engine;
use super::{BackendKind, DataBackend, Row, RunResult, schema};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub struct EmbeddedBackend {
    engine: Engine,
    path: PathBuf,
}

impl EmbeddedBackend {
    /// Open a database file, creating and seeding it if absent.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        if !schema::is_bootstrapped(&conn)? {
            tracing::info!(path = %path.display(), "creating tables and seeding data");
            schema::bootstrap(&conn)?;
        }
        Ok(Self {
            engine: Engine::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataBackend for EmbeddedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Embedded
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
        Ok(format!("Embedded database ready at {}", self.path.display()))
    }
}
