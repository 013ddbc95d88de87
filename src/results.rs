//! Accumulates per-index columns while a request is in flight.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::NameHasher;
use crate::error::{MindyError, Result};

/// Shared accumulator written by the coordinator. The only way in is
/// [`ResultAggregate::set`]; the only way out is [`ResultAggregate::freeze`].
#[derive(Debug, Default)]
pub struct ResultAggregate {
    bits: Mutex<HashMap<String, Vec<u64>, NameHasher>>,
}

impl ResultAggregate {
    pub fn new() -> Self {
        Self::default()
    }
    /// Stores the columns for `partition`, replacing whatever was there.
    pub fn set(&self, partition: &str, columns: Vec<u64>) -> Result<()> {
        let mut bits = self
            .bits
            .lock()
            .map_err(|e| MindyError::Internal(format!("result aggregate lock poisoned: {e}")))?;
        bits.insert(partition.to_owned(), columns);
        Ok(())
    }
    pub fn freeze(self) -> Result<Results> {
        let bits = self
            .bits
            .into_inner()
            .map_err(|e| MindyError::Internal(format!("result aggregate lock poisoned: {e}")))?;
        Ok(Results { bits: bits.into_iter().collect() })
    }
}

/// The response to a request: matching columns keyed by index name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Results {
    pub bits: BTreeMap<String, Vec<u64>>,
}

impl Results {
    pub fn get(&self, partition: &str) -> Option<&[u64]> {
        self.bits.get(partition).map(Vec::as_slice)
    }
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    pub fn column_count(&self) -> usize {
        self.bits.values().map(Vec::len).sum()
    }
    /// One `index,column` line per matching column.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for (index, columns) in &self.bits {
            for col in columns {
                let _ = writeln!(out, "{index},{col}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_set_overwrites() {
        let agg = ResultAggregate::new();
        agg.set("p1", vec![1, 2]).unwrap();
        agg.set("p3", vec![6, 3]).unwrap();
        agg.set("p1", vec![9]).unwrap();
        let results = agg.freeze().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.get("p1"), Some(&[9][..]));
        // engine order is kept, not sorted
        assert_eq!(results.get("p3"), Some(&[6, 3][..]));
    }

    #[test]
    fn csv_lines() {
        let agg = ResultAggregate::new();
        agg.set("p3", vec![3]).unwrap();
        agg.set("p1", vec![1, 2]).unwrap();
        let results = agg.freeze().unwrap();
        assert_eq!(results.to_csv(), "p1,1\np1,2\np3,3\n");
        assert_eq!(results.column_count(), 3);
    }

    #[test]
    fn json_shape() {
        let agg = ResultAggregate::new();
        agg.set("p1", vec![1, 2]).unwrap();
        let json = serde_json::to_string(&agg.freeze().unwrap()).unwrap();
        assert_eq!(json, r#"{"bits":{"p1":[1,2]}}"#);
    }
}
