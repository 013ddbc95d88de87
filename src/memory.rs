//! An [`Engine`] that keeps its bitmaps in process.
//!
//! Every (index, frame, row) owns a `RoaringTreemap` of columns. Expressions
//! are evaluated the way Pilosa evaluates them. Zero-argument `Intersect()`
//! and `Union()` both match nothing, the same answer the executor gives for a
//! request without included rows.

use std::collections::HashMap;
use std::sync::RwLock;

use roaring::RoaringTreemap;

use crate::NameHasher;
use crate::engine::{Engine, PartitionSchema, QueryResponse, SHARD_WIDTH, Schema};
use crate::error::{MindyError, Result};
use crate::query::{Expr, Query};

type Frame = HashMap<u64, RoaringTreemap>;

#[derive(Debug, Default)]
struct Index {
    frames: HashMap<String, Frame, NameHasher>,
}

impl Index {
    fn max_column(&self) -> Option<u64> {
        self.frames
            .values()
            .flat_map(|frame| frame.values())
            .filter_map(RoaringTreemap::max)
            .max()
    }

    fn eval(&self, index: &str, expr: &Expr) -> Result<RoaringTreemap> {
        match expr {
            Expr::Bitmap { frame, row_id } => {
                let rows = self.frames.get(frame).ok_or_else(|| MindyError::QueryExecution {
                    partition: index.to_owned(),
                    message: format!("frame not found: {frame}"),
                })?;
                Ok(rows.get(row_id).cloned().unwrap_or_default())
            }
            Expr::Intersect(args) => {
                let mut iter = args.iter();
                let Some(first) = iter.next() else {
                    return Ok(RoaringTreemap::new());
                };
                let mut result = self.eval(index, first)?;
                for arg in iter {
                    result &= self.eval(index, arg)?;
                }
                Ok(result)
            }
            Expr::Union(args) => {
                let mut result = RoaringTreemap::new();
                for arg in args {
                    result |= self.eval(index, arg)?;
                }
                Ok(result)
            }
            Expr::Difference(args) => {
                let mut iter = args.iter();
                let Some(first) = iter.next() else {
                    return Ok(RoaringTreemap::new());
                };
                let mut result = self.eval(index, first)?;
                for arg in iter {
                    result -= self.eval(index, arg)?;
                }
                Ok(result)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryEngine {
    indexes: RwLock<HashMap<String, Index, NameHasher>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_index(&self, index: &str) -> Result<()> {
        self.write()?.entry(index.to_owned()).or_default();
        Ok(())
    }

    pub fn create_frame(&self, index: &str, frame: &str) -> Result<()> {
        self.write()?
            .entry(index.to_owned())
            .or_default()
            .frames
            .entry(frame.to_owned())
            .or_default();
        Ok(())
    }

    /// Sets one bit, creating the index and frame on first use.
    pub fn set_bit(&self, index: &str, frame: &str, row: u64, column: u64) -> Result<()> {
        self.write()?
            .entry(index.to_owned())
            .or_default()
            .frames
            .entry(frame.to_owned())
            .or_default()
            .entry(row)
            .or_default()
            .insert(column);
        Ok(())
    }

    /// Evaluates `query` and returns the matching columns in ascending order.
    pub fn evaluate(&self, query: &Query, shard: Option<u64>) -> Result<Vec<u64>> {
        let indexes = self.read()?;
        let index = indexes.get(query.index()).ok_or_else(|| MindyError::QueryExecution {
            partition: query.index().to_owned(),
            message: "index not found".into(),
        })?;
        let columns = index.eval(query.index(), query.expr())?;
        Ok(match shard {
            None => columns.iter().collect(),
            Some(shard) => columns.iter().filter(|col| col / SHARD_WIDTH == shard).collect(),
        })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Index, NameHasher>>> {
        self.indexes.read().map_err(|e| MindyError::Internal(format!("memory engine lock poisoned: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Index, NameHasher>>> {
        self.indexes.write().map_err(|e| MindyError::Internal(format!("memory engine lock poisoned: {e}")))
    }
}

impl Engine for MemoryEngine {
    async fn schema(&self) -> Result<Schema> {
        let indexes = self.read()?;
        let mut schema = Schema::new();
        for (name, index) in indexes.iter() {
            schema.insert(PartitionSchema::new(name.as_str(), index.frames.keys().map(String::as_str)));
        }
        Ok(schema)
    }

    async fn max_shards(&self) -> Result<HashMap<String, u64>> {
        let indexes = self.read()?;
        Ok(indexes
            .iter()
            .map(|(name, index)| (name.clone(), index.max_column().map_or(0, |col| col / SHARD_WIDTH)))
            .collect())
    }

    async fn query(&self, query: &Query, shard: Option<u64>) -> Result<QueryResponse> {
        self.evaluate(query, shard).map(QueryResponse::single)
    }
}
