//! Runs the request against a single index.

use tracing::debug;

use crate::engine::{Engine, QueryResponse};
use crate::error::{MindyError, Result};
use crate::limiter::Limiter;
use crate::query::build_query;
use crate::request::Request;

/// Resolves the schema, builds and submits the query for `partition`, and
/// returns the matching columns in the order Pilosa sent them.
///
/// A request without included rows matches nothing in every index; the
/// query is still built, so unknown frames in the excludes are reported, but
/// it is never sent.
///
/// A limiter slot is held from the schema lookup until the query call returns;
/// extracting the columns happens after the slot is handed back.
pub async fn execute<E: Engine>(
    engine: &E,
    limiter: &Limiter,
    partition: &str,
    request: &Request,
    shard: Option<u64>,
) -> Result<Vec<u64>> {
    let response = {
        let _slot = limiter.acquire().await?;
        let schema = engine.schema().await?;
        let index = schema.index(partition).ok_or_else(|| MindyError::UnknownPartition {
            partition: partition.to_owned(),
        })?;
        let query = build_query(index, request)?;
        if query.selects_nothing() {
            debug!(index = partition, ?shard, "no included rows, skipping query");
            return Ok(Vec::new());
        }
        debug!(index = partition, ?shard, pql = %query, "querying index");
        engine.query(&query, shard).await?
    };
    columns(partition, response)
}

/// Pulls the columns out of a non-batch response, which must hold exactly one
/// result.
pub fn columns(partition: &str, response: QueryResponse) -> Result<Vec<u64>> {
    if let Some(message) = response.error {
        return Err(MindyError::QueryExecution { partition: partition.to_owned(), message });
    }
    let count = response.results.len();
    match <[_; 1]>::try_from(response.results) {
        Ok([result]) => Ok(result.bits),
        Err(_) => Err(MindyError::MalformedResponse { partition: partition.to_owned(), count }),
    }
}
