#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mindy::engine::{Engine, QueryResponse, QueryResult, Schema};
use mindy::query::Query;
use mindy::{Coordinator, Limiter, MemoryEngine, MindyError};

pub const INDEXES: [&str; 4] = ["p1", "two", "p3", "p4"];

/// Index `i` gets, for rows 0..5, every `1 + i + row`th column below 100 set
/// in f1, and the odd ones of those also set in f2.
pub fn populated() -> MemoryEngine {
    let engine = MemoryEngine::new();
    for (i, idx) in INDEXES.iter().enumerate() {
        let i = i as u64;
        engine.create_frame(idx, "f1").unwrap();
        engine.create_frame(idx, "f2").unwrap();
        for row in 0..5u64 {
            let mut bit = 0;
            while bit < 100 {
                engine.set_bit(idx, "f1", row, bit).unwrap();
                if bit % 2 == 1 {
                    engine.set_bit(idx, "f2", row, bit).unwrap();
                }
                bit += 1 + i + row;
            }
        }
    }
    engine
}

/// Columns `start, start + step, ...` below 100.
pub fn columns(start: u64, step: u64) -> Vec<u64> {
    (start..100).step_by(step as usize).collect()
}

pub fn coordinator<E: Engine>(engine: E, capacity: usize) -> Coordinator<E> {
    Coordinator::new(Arc::new(engine), Limiter::new(capacity).unwrap())
}

/// Wraps a memory engine, recording how many calls are in flight at once and
/// slowing every call down so overlaps actually happen.
#[derive(Default)]
pub struct Instrumented {
    pub inner: MemoryEngine,
    pub delay: Duration,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub queries: AtomicUsize,
}

impl Instrumented {
    pub fn new(inner: MemoryEngine, delay: Duration) -> Self {
        Self { inner, delay, ..Self::default() }
    }

    async fn observed<T>(&self, call: impl std::future::Future<Output = T>) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let out = call.await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }
}

impl Engine for Instrumented {
    async fn schema(&self) -> mindy::Result<Schema> {
        self.observed(self.inner.schema()).await
    }
    async fn max_shards(&self) -> mindy::Result<HashMap<String, u64>> {
        self.inner.max_shards().await
    }
    async fn query(&self, query: &Query, shard: Option<u64>) -> mindy::Result<QueryResponse> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.observed(self.inner.query(query, shard)).await
    }
}

/// How a [`Scripted`] engine answers a query for one index.
#[derive(Clone)]
pub enum Answer {
    /// Return these columns, as given.
    Bits(Vec<u64>),
    /// Return this many result sets.
    ResultSets(usize),
    /// Fail after the delay.
    Fail(Duration),
    /// Succeed with nothing after the delay.
    Slow(Duration),
}

/// An engine whose schema has frames f1 and f2 in every scripted index and
/// whose query answers are fixed per index.
pub struct Scripted {
    pub answers: HashMap<String, Answer>,
    pub completed: AtomicUsize,
}

impl Scripted {
    pub fn new(answers: &[(&str, Answer)]) -> Self {
        Self {
            answers: answers.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            completed: AtomicUsize::new(0),
        }
    }
}

impl Engine for Scripted {
    async fn schema(&self) -> mindy::Result<Schema> {
        let mut schema = Schema::new();
        for name in self.answers.keys() {
            schema.insert(mindy::engine::PartitionSchema::new(name.as_str(), ["f1", "f2"]));
        }
        Ok(schema)
    }
    async fn max_shards(&self) -> mindy::Result<HashMap<String, u64>> {
        Ok(self.answers.keys().map(|k| (k.clone(), 0)).collect())
    }
    async fn query(&self, query: &Query, _shard: Option<u64>) -> mindy::Result<QueryResponse> {
        let answer = self.answers[query.index()].clone();
        let out = match answer {
            Answer::Bits(bits) => Ok(QueryResponse::single(bits)),
            Answer::ResultSets(n) => Ok(QueryResponse {
                results: vec![QueryResult::default(); n],
                error: None,
            }),
            Answer::Fail(delay) => {
                tokio::time::sleep(delay).await;
                Err(MindyError::QueryExecution {
                    partition: query.index().to_owned(),
                    message: "engine rejected query".into(),
                })
            }
            Answer::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(QueryResponse::single(vec![]))
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        out
    }
}
