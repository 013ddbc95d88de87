//! HTTP client for a Pilosa cluster.
//!
//! Only the three endpoints the proxy needs are covered: `GET /schema`,
//! `GET /slices/max` and `POST /index/{index}/query`. Requests are spread
//! over the configured hosts round-robin.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::engine::{Engine, PartitionSchema, QueryResponse, Schema};
use crate::error::{MindyError, Result};
use crate::query::Query;

#[derive(Debug)]
pub struct PilosaClient {
    hosts: Vec<String>,
    next: AtomicUsize,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SchemaBody {
    #[serde(default)]
    indexes: Option<Vec<IndexBody>>,
}

#[derive(Deserialize)]
struct IndexBody {
    name: String,
    #[serde(default)]
    frames: Option<Vec<FrameBody>>,
}

#[derive(Deserialize)]
struct FrameBody {
    name: String,
}

#[derive(Deserialize)]
struct SlicesMaxBody {
    #[serde(rename = "maxSlices", default)]
    max_slices: HashMap<String, u64>,
}

impl PilosaClient {
    pub fn new(hosts: Vec<String>, timeout: Option<Duration>) -> Result<Self> {
        if hosts.is_empty() {
            return Err(MindyError::Config("at least one pilosa host is required".into()));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| MindyError::Config(format!("creating Pilosa client: {e}")))?;
        let hosts = hosts.into_iter().map(normalize).collect::<Result<Vec<_>>>()?;
        Ok(Self { hosts, next: AtomicUsize::new(0), http })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    fn url(&self, path: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        format!("{}{}", self.hosts[n], path)
    }
}

/// `localhost:10101` becomes `http://localhost:10101`. The client is built
/// without TLS, so `https://` hosts are refused up front.
fn normalize(host: String) -> Result<String> {
    let host = host.trim_end_matches('/').to_owned();
    if host.starts_with("https://") {
        return Err(MindyError::Config(format!("pilosa host {host}: https is not supported")));
    }
    if host.starts_with("http://") {
        Ok(host)
    } else {
        Ok(format!("http://{host}"))
    }
}

fn schema_from(body: SchemaBody) -> Schema {
    let mut schema = Schema::new();
    for index in body.indexes.unwrap_or_default() {
        let frames = index.frames.unwrap_or_default().into_iter().map(|f| f.name);
        schema.insert(PartitionSchema::new(index.name, frames));
    }
    schema
}

impl Engine for PilosaClient {
    async fn schema(&self) -> Result<Schema> {
        let resp = self
            .http
            .get(self.url("/schema"))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MindyError::SchemaResolution(e.to_string()))?;
        let body: SchemaBody = resp
            .json()
            .await
            .map_err(|e| MindyError::SchemaResolution(format!("decoding schema: {e}")))?;
        Ok(schema_from(body))
    }

    async fn max_shards(&self) -> Result<HashMap<String, u64>> {
        let resp = self
            .http
            .get(self.url("/slices/max"))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| MindyError::ShardResolution(e.to_string()))?;
        let body: SlicesMaxBody = resp
            .json()
            .await
            .map_err(|e| MindyError::ShardResolution(format!("unmarshaling slices max: {e}")))?;
        Ok(body.max_slices)
    }

    async fn query(&self, query: &Query, shard: Option<u64>) -> Result<QueryResponse> {
        let failed = |message: String| MindyError::QueryExecution {
            partition: query.index().to_owned(),
            message,
        };
        let mut request = self
            .http
            .post(self.url(&format!("/index/{}/query", query.index())))
            .body(query.to_string());
        if let Some(shard) = shard {
            request = request.query(&[("slices", shard)]);
        }
        debug!(index = query.index(), ?shard, "posting query to pilosa");
        let resp = request.send().await.map_err(|e| failed(e.to_string()))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| failed(e.to_string()))?;
        if !status.is_success() {
            return Err(failed(format!("status {}: {}", status.as_u16(), text.trim())));
        }
        let body: QueryResponse =
            serde_json::from_str(&text).map_err(|e| failed(format!("decoding response: {e}")))?;
        if let Some(message) = body.error {
            return Err(failed(message));
        }
        Ok(body)
    }
}
