//! Fans a request out over its indexes and gathers the answers.
//!
//! One task is spawned per requested index (or per index and shard when shard
//! fan-out is on). Every task waits for a [`Limiter`] slot before it talks to
//! Pilosa, so a request naming fifty indexes still only keeps `concurrency`
//! queries in flight.
//!
//! The first task to fail decides the outcome of the whole request. Its error
//! cancels the sibling tasks through a shared [`CancellationToken`]: tasks that
//! have not reached Pilosa yet skip their work and in-flight calls are dropped.
//! Nothing partial is ever returned.
//!
//! When every task succeeds the columns are written into a [`ResultAggregate`]
//! in request order, so for a repeated index name the last occurrence wins.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::{MindyError, Result};
use crate::executor;
use crate::limiter::Limiter;
use crate::request::Request;
use crate::results::{ResultAggregate, Results};

/// What a finished task hands back: its position in the request, the shard it
/// covered, and the columns. `None` when it was cancelled before finishing.
type TaskOutput = Option<(usize, Option<u64>, Vec<u64>)>;

pub struct Coordinator<E> {
    engine: Arc<E>,
    limiter: Limiter,
    shard_fanout: bool,
}

impl<E> Clone for Coordinator<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            limiter: self.limiter.clone(),
            shard_fanout: self.shard_fanout,
        }
    }
}

impl<E: Engine> Coordinator<E> {
    pub fn new(engine: Arc<E>, limiter: Limiter) -> Self {
        Self { engine, limiter, shard_fanout: false }
    }
    /// Query every shard of an index separately instead of leaving the shards
    /// to Pilosa.
    pub fn with_shard_fanout(mut self, shard_fanout: bool) -> Self {
        self.shard_fanout = shard_fanout;
        self
    }
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    pub async fn execute(&self, request: Request) -> Result<Results> {
        let started = Instant::now();
        match self.run(request).await {
            Ok(results) => {
                info!(
                    ms = started.elapsed().as_secs_f64() * 1000.0,
                    indexes = results.len(),
                    columns = results.column_count(),
                    "query complete"
                );
                Ok(results)
            }
            Err(e) => {
                warn!(error = %e, ms = started.elapsed().as_secs_f64() * 1000.0, "query failed");
                Err(e)
            }
        }
    }

    async fn run(&self, request: Request) -> Result<Results> {
        request.validate()?;
        let request = Arc::new(request);

        let shard_bounds = if self.shard_fanout {
            Some(self.engine.max_shards().await?)
        } else {
            None
        };

        // dispatching
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        for (slot, partition) in request.partitions.iter().enumerate() {
            for shard in shards_for(partition, shard_bounds.as_ref())? {
                let engine = Arc::clone(&self.engine);
                let limiter = self.limiter.clone();
                let request = Arc::clone(&request);
                let cancel = cancel.clone();
                let partition = partition.clone();
                tasks.spawn(async move {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => Ok(None),
                        columns = executor::execute(engine.as_ref(), &limiter, &partition, &request, shard) => {
                            columns.map(|columns| Some((slot, shard, columns)))
                        }
                    }
                });
            }
        }
        debug!(indexes = request.partitions.len(), tasks = tasks.len(), "dispatched");

        // awaiting
        let mut finished: BTreeMap<(usize, Option<u64>), Vec<u64>> = BTreeMap::new();
        let mut failure: Option<MindyError> = None;
        while let Some(joined) = tasks.join_next().await {
            let output: Result<TaskOutput> = joined.map_err(MindyError::from).and_then(|r| r);
            match output {
                Ok(Some((slot, shard, columns))) => {
                    finished.insert((slot, shard), columns);
                }
                Ok(None) => (),
                Err(e) => {
                    if failure.is_none() {
                        debug!(error = %e, "cancelling sibling tasks");
                        cancel.cancel();
                        failure = Some(e);
                    }
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }

        // completed: shards of one index are concatenated in ascending order
        let mut per_slot: Vec<Vec<u64>> = vec![Vec::new(); request.partitions.len()];
        for ((slot, _shard), columns) in finished {
            per_slot[slot].extend(columns);
        }
        let aggregate = ResultAggregate::new();
        for (partition, columns) in request.partitions.iter().zip(per_slot) {
            aggregate.set(partition, columns)?;
        }
        aggregate.freeze()
    }
}

fn shards_for(partition: &str, bounds: Option<&HashMap<String, u64>>) -> Result<Vec<Option<u64>>> {
    match bounds {
        None => Ok(vec![None]),
        Some(bounds) => {
            let max = bounds.get(partition).ok_or_else(|| {
                MindyError::ShardResolution(format!("index '{partition}' not found in max slices"))
            })?;
            Ok((0..=*max).map(Some).collect())
        }
    }
}
