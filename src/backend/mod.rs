//! Persistence backends
//!
//! One capability interface, three conforming implementations:
//! - `RemoteBackend`: the platform API over HTTP (async)
//! - `EmbeddedBackend`: file-backed SQLite under the data directory
//! - `EphemeralBackend`: in-memory SQLite, seeded fresh every start
//!
//! The backend is chosen once at startup from configuration; nothing
//! above this module branches on backend identity.

pub mod embedded;
pub(crate) mod engine;
pub mod ephemeral;
pub mod remote;
pub mod schema;

pub use embedded::EmbeddedBackend;
pub use ephemeral::EphemeralBackend;
pub use remote::RemoteBackend;

use crate::config::AgriConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// A result row: column name to JSON value
pub type Row = serde_json::Map<String, Value>;

/// Outcome of a single mutating statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub last_insert_id: Option<i64>,
    pub changes: u64,
}

/// Which persistence implementation a deployment runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Remote,
    Embedded,
    Ephemeral,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Embedded => "embedded",
            BackendKind::Ephemeral => "ephemeral",
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "remote" | "api" | "http" => Ok(BackendKind::Remote),
            "embedded" | "sqlite" | "local" => Ok(BackendKind::Embedded),
            "ephemeral" | "memory" | "demo" => Ok(BackendKind::Ephemeral),
            _ => Err(Error::Validation(format!("Unknown backend kind: {}", s))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The stable persistence contract every backend conforms to.
///
/// Callers treat statements as opaque text plus JSON parameters and get
/// JSON rows back, so swapping backends never touches call sites.
#[async_trait]
pub trait DataBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Read-only statement. Never changes state.
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Single mutating statement.
    async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult>;

    /// Ad-hoc statement, read or write; no changes/lastInsertId shape.
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Statement batch, split on terminators and applied sequentially.
    /// The first failure aborts the remainder; applied statements are
    /// not rolled back.
    async fn run_script(&self, script: &str) -> Result<()>;

    /// Serialize the full current state. Empty for backends with no
    /// exportable image (the remote API).
    async fn export_snapshot(&self) -> Result<Vec<u8>>;

    /// Replace the full current state wholesale.
    async fn import_snapshot(&self, bytes: &[u8]) -> Result<()>;

    /// Discard current state and rebuild from schema + seed.
    async fn reset_to_seed(&self) -> Result<()>;

    /// Connectivity check; the returned text is a human-readable status.
    async fn probe(&self) -> Result<String>;
}

/// Build the configured backend. Called exactly once per process, at
/// startup.
pub fn from_config(config: &AgriConfig) -> Result<Box<dyn DataBackend>> {
    match config.backend_kind()? {
        BackendKind::Remote => Ok(Box::new(RemoteBackend::new(config.api_url())?)),
        BackendKind::Embedded => {
            let path = config.database_path();
            crate::config::ensure_db_dir(&path)
                .map_err(|e| Error::Connectivity(e.to_string()))?;
            Ok(Box::new(EmbeddedBackend::open(&path)?))
        }
        BackendKind::Ephemeral => Ok(Box::new(EphemeralBackend::new()?)),
    }
}
