//! Remote backend - the platform API over HTTP
//!
//! Thin JSON client for the fixed `/api` contract: `POST /query`,
//! `POST /run`, `POST /execute`, `GET /test`. Error messages from the
//! server are surfaced untouched so the console can show them verbatim.
//! Snapshots have no remote representation: export is empty by
//! contract, import and reset are unsupported.

use super::{BackendKind, DataBackend, Row, RunResult};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct SqlBody<'a> {
    sql: &'a str,
    params: &'a [Value],
}

/// Superset of every `/api` response shape; absent fields default.
#[derive(Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Vec<Row>>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "lastInsertId")]
    last_insert_id: Option<i64>,
    #[serde(default)]
    changes: Option<u64>,
}

impl RemoteBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, endpoint: &str, sql: &str, params: &[Value]) -> Result<ApiEnvelope> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, sql, "api request");
        let response = self
            .client
            .post(&url)
            .json(&SqlBody { sql, params })
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    /// Decode the `{success, ...}` envelope, turning transport failures
    /// and `success: false` bodies into statement errors that carry the
    /// server's own message.
    async fn unwrap_envelope(response: reqwest::Response) -> Result<ApiEnvelope> {
        let status = response.status();
        let envelope: ApiEnvelope = match response.json().await {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(Error::Statement(format!("HTTP error! status: {}", status)));
            }
            Err(e) => return Err(Error::Statement(e.to_string())),
        };
        if !envelope.success {
            let message = envelope
                .error
                .unwrap_or_else(|| "API request failed".to_string());
            return Err(Error::Statement(message));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl DataBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let envelope = self.post("/query", sql, params).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn run(&self, sql: &str, params: &[Value]) -> Result<RunResult> {
        let envelope = self.post("/run", sql, params).await?;
        Ok(RunResult {
            last_insert_id: envelope.last_insert_id,
            changes: envelope.changes.unwrap_or(0),
        })
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let envelope = self.post("/execute", sql, params).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn run_script(&self, script: &str) -> Result<()> {
        for stmt in super::engine::split_statements(script) {
            self.execute(stmt, &[]).await?;
        }
        Ok(())
    }

    async fn export_snapshot(&self) -> Result<Vec<u8>> {
        // Contract gap carried over from the platform API: there is no
        // remote export endpoint, so the snapshot is empty.
        Ok(Vec::new())
    }

    async fn import_snapshot(&self, _bytes: &[u8]) -> Result<()> {
        Err(Error::Unsupported(
            "snapshot import is not available against the remote API".to_string(),
        ))
    }

    async fn reset_to_seed(&self) -> Result<()> {
        Err(Error::Unsupported(
            "seed reset is not available against the remote API".to_string(),
        ))
    }

    async fn probe(&self) -> Result<String> {
        let url = format!("{}/test", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        let envelope = Self::unwrap_envelope(response)
            .await
            .map_err(|e| Error::Connectivity(e.to_string()))?;
        Ok(envelope
            .message
            .unwrap_or_else(|| "Database connected successfully".to_string()))
    }
}
