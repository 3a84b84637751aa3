//! Data access facade
//!
//! `Database` is the one contract the rest of the platform programs
//! against, regardless of which backend a deployment configured. It
//! owns the process-wide revision counter: a monotonic integer bumped
//! by every state-changing operation and watched by live queries as a
//! deliberately coarse invalidation signal (any mutation anywhere
//! invalidates every active query everywhere).

use crate::backend::{self, DataBackend, Row, RunResult};
use crate::config::AgriConfig;
use crate::{Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Cheaply cloneable handle over the configured backend plus the
/// revision counter. All clones share both.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Box<dyn DataBackend>,
    revision: watch::Sender<u64>,
}

impl Database {
    /// Build the configured backend, probe it, and hand back a ready
    /// facade. Failure is terminal for the session: there is no retry,
    /// and the caller is expected to render a fatal error surface.
    pub async fn connect(config: &AgriConfig) -> Result<Self> {
        let backend = backend::from_config(config)?;
        let db = Self::with_backend(backend);
        let status = db.inner.backend.probe().await.map_err(|e| match e {
            Error::Connectivity(msg) => Error::Connectivity(msg),
            other => Error::Connectivity(other.to_string()),
        })?;
        tracing::info!(backend = %db.inner.backend.kind(), %status, "database ready");
        Ok(db)
    }

    /// Wrap an already-built backend without probing. The seam the
    /// server and the test suite use to inject a specific backend.
    pub fn with_backend(backend: Box<dyn DataBackend>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner { backend, revision }),
        }
    }

    /// Current revision snapshot.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Subscribe to revision bumps. Receivers see the post-increment
    /// value; the bump is published before the mutating call returns,
    /// so a subscriber that re-reads after a change observes the write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    fn bump_revision(&self) {
        self.inner.revision.send_modify(|rev| *rev += 1);
    }

    /// Read-only statement; never touches the revision counter.
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.inner.backend.query(sql, params).await
    }

    /// Single mutating statement. Bumps the revision exactly once when
    /// the statement succeeds and actually changed rows; a failed or
    /// no-op statement leaves the counter untouched (nothing to
    /// invalidate).
    pub async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        let result = self.inner.backend.run(sql, params).await?;
        if result.changes > 0 {
            self.bump_revision();
        }
        Ok(result)
    }

    /// Ad-hoc console statement, read or write. Matches the original
    /// provider: no revision bump and no changes/lastInsertId shape.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.inner.backend.execute(sql, params).await
    }

    /// Statement batch; bumps the revision once on success.
    pub async fn run_script(&self, script: &str) -> Result<()> {
        self.inner.backend.run_script(script).await?;
        self.bump_revision();
        Ok(())
    }

    /// Serialize the full current state.
    pub async fn export_snapshot(&self) -> Result<Vec<u8>> {
        self.inner.backend.export_snapshot().await
    }

    /// Replace the full current state; bumps the revision.
    pub async fn import_snapshot(&self, bytes: &[u8]) -> Result<()> {
        self.inner.backend.import_snapshot(bytes).await?;
        self.bump_revision();
        Ok(())
    }

    /// Discard current state and reload schema + seed; bumps the
    /// revision.
    pub async fn reset_to_seed(&self) -> Result<()> {
        self.inner.backend.reset_to_seed().await?;
        self.bump_revision();
        Ok(())
    }

    /// Connectivity check against the live backend.
    pub async fn probe(&self) -> Result<String> {
        self.inner.backend.probe().await
    }
}
