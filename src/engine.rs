//! The external query engine the proxy fans out to.
//!
//! [`Engine`] is the seam between the fan-out core and whatever actually
//! stores the bitmaps: [`crate::pilosa::PilosaClient`] talks to a Pilosa
//! cluster over HTTP, [`crate::memory::MemoryEngine`] evaluates the same
//! expressions against in-process roaring bitmaps.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::NameHasher;
use crate::error::Result;
use crate::query::Query;

/// Number of columns held by one shard (Pilosa calls them slices).
pub const SHARD_WIDTH: u64 = 1 << 20;

pub trait Engine: Send + Sync + 'static {
    /// Fetches the schema of every index the engine knows about.
    fn schema(&self) -> impl Future<Output = Result<Schema>> + Send;

    /// Highest shard number in use, per index.
    fn max_shards(&self) -> impl Future<Output = Result<HashMap<String, u64>>> + Send;

    /// Executes `query`, restricted to a single shard when one is given.
    fn query(&self, query: &Query, shard: Option<u64>) -> impl Future<Output = Result<QueryResponse>> + Send;
}

// ------------- Schema -------------
#[derive(Debug, Clone, Default)]
pub struct Schema {
    indexes: HashMap<String, PartitionSchema, NameHasher>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, partition: PartitionSchema) {
        self.indexes.insert(partition.name.clone(), partition);
    }
    pub fn index(&self, name: &str) -> Option<&PartitionSchema> {
        self.indexes.get(name)
    }
    pub fn len(&self) -> usize {
        self.indexes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// The frames known within one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSchema {
    name: String,
    frames: HashSet<String, NameHasher>,
}

impl PartitionSchema {
    pub fn new<I, S>(name: impl Into<String>, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn has_frame(&self, frame: &str) -> bool {
        self.frames.contains(frame)
    }
}

// ------------- Responses -------------
/// The body Pilosa returns for `POST /index/{index}/query`. A plain bitmap
/// query yields one entry in `results`, a batch query one per call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<QueryResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub bits: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<serde_json::Value>,
}

impl QueryResponse {
    pub fn single(bits: Vec<u64>) -> Self {
        Self { results: vec![QueryResult { bits, attrs: None }], error: None }
    }
}
