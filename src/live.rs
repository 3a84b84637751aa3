//! Live queries - revision-driven reactive reads
//!
//! `LiveQuery` binds a consumer to the result of one statement and
//! keeps it fresh: the bound statement re-executes whenever the
//! statement or its parameters change, and whenever the facade's
//! revision counter bumps (any mutation anywhere). Consumers observe a
//! `QuerySnapshot { data, loading, error }` through a watch channel.
//!
//! Ordering guarantee: last dispatched wins, not last completed. Every
//! dispatch captures a generation token; a result is only applied while
//! its token is still the latest, so a superseded request can never
//! overwrite a newer one even if it resolves later.

use crate::{Database, Row};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What a subscribed consumer currently sees
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub data: Vec<Row>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for QuerySnapshot {
    fn default() -> Self {
        // Loading until the first bound statement resolves; an unbound
        // hook stays in this state.
        Self {
            data: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    sql: String,
    params: Vec<Value>,
    #[allow(dead_code)]
    key: Option<String>,
}

/// A statement subscription driven by a background task.
pub struct LiveQuery {
    generation: Arc<AtomicU64>,
    binding_tx: watch::Sender<Option<Binding>>,
    snapshot_rx: watch::Receiver<QuerySnapshot>,
    driver: JoinHandle<()>,
}

impl LiveQuery {
    pub fn new(db: Database) -> Self {
        let generation = Arc::new(AtomicU64::new(0));
        let (binding_tx, binding_rx) = watch::channel(None);
        let (snapshot_tx, snapshot_rx) = watch::channel(QuerySnapshot::default());
        let driver = tokio::spawn(drive(db, generation.clone(), binding_rx, snapshot_tx));
        Self {
            generation,
            binding_tx,
            snapshot_rx,
            driver,
        }
    }

    /// Bind a statement, or pass `None` to park the subscription (used
    /// while a dependent parameter, e.g. a selected forum id, is not
    /// yet chosen).
    pub fn set_query(&self, sql: Option<&str>, params: Vec<Value>) {
        self.set_query_with_key(sql, params, None);
    }

    /// Like [`set_query`](Self::set_query) with an extra cache-bust
    /// key: re-dispatches even when statement and parameters are
    /// unchanged.
    pub fn set_query_with_key(&self, sql: Option<&str>, params: Vec<Value>, key: Option<String>) {
        // The bump supersedes any in-flight execution before the new
        // binding is published.
        self.generation.fetch_add(1, Ordering::SeqCst);
        let binding = sql.map(|sql| Binding {
            sql: sql.to_string(),
            params,
            key,
        });
        self.binding_tx.send_replace(binding);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> QuerySnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn watch(&self) -> watch::Receiver<QuerySnapshot> {
        self.snapshot_rx.clone()
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive(
    db: Database,
    generation: Arc<AtomicU64>,
    mut binding_rx: watch::Receiver<Option<Binding>>,
    snapshot_tx: watch::Sender<QuerySnapshot>,
) {
    let mut revision_rx = db.subscribe();
    loop {
        let binding = binding_rx.borrow_and_update().clone();
        if let Some(binding) = binding {
            let token = generation.load(Ordering::SeqCst);
            snapshot_tx.send_modify(|snap| snap.loading = true);

            let result = db.query(&binding.sql, &binding.params).await;

            // A dispatch that happened while we were executing owns the
            // subscription now; this result must not be applied.
            if generation.load(Ordering::SeqCst) == token {
                match result {
                    Ok(rows) => snapshot_tx.send_modify(|snap| {
                        snap.data = rows;
                        snap.error = None;
                        snap.loading = false;
                    }),
                    Err(err) => snapshot_tx.send_modify(|snap| {
                        snap.error = Some(err.to_string());
                        snap.loading = false;
                    }),
                }
            }
        }

        tokio::select! {
            changed = binding_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = revision_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
