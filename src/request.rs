//! The request accepted by the proxy.
//!
//! A request names the indexes to query, the rows to include and exclude, and
//! the conjunction deciding whether the included rows are intersected or
//! unioned. The JSON shape is the one clients of the original `/mindy`
//! endpoint already send:
//!
//! ```json
//! {"indexes": ["p1", "p3"],
//!  "includes": [{"id": 0, "frame": "f1"}],
//!  "excludes": [],
//!  "conjunction": "and"}
//! ```

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MindyError, Result};

lazy_static! {
    // same rule Pilosa applies to index and frame names
    static ref NAME: Regex = Regex::new(r"^[a-z][a-z0-9_-]{0,63}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "indexes")]
    pub partitions: Vec<String>,
    #[serde(default)]
    pub includes: Vec<Row>,
    #[serde(default)]
    pub excludes: Vec<Row>,
    pub conjunction: String,
}

/// A single Pilosa row, addressed by its id within a frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    pub id: u64,
    #[serde(rename = "frame")]
    pub category: String,
}

impl Row {
    pub fn new(id: u64, category: impl Into<String>) -> Self {
        Self { id, category: category.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl FromStr for Conjunction {
    type Err = String;
    fn from_str(token: &str) -> std::result::Result<Self, Self::Err> {
        match token {
            "and" => Ok(Conjunction::And),
            "or" => Ok(Conjunction::Or),
            other => Err(other.to_owned()),
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => write!(f, "and"),
            Conjunction::Or => write!(f, "or"),
        }
    }
}

impl Request {
    pub fn new(partitions: Vec<String>, includes: Vec<Row>, excludes: Vec<Row>, conjunction: Conjunction) -> Self {
        Self { partitions, includes, excludes, conjunction: conjunction.to_string() }
    }

    /// Parses the conjunction token, naming `partition` in the error.
    pub fn conjunction_for(&self, partition: &str) -> Result<Conjunction> {
        self.conjunction.parse().map_err(|token| MindyError::InvalidConjunction {
            partition: partition.to_owned(),
            token,
        })
    }

    /// Checks everything that can be checked without asking Pilosa, so that a
    /// bad request is rejected before any partition query is dispatched.
    pub fn validate(&self) -> Result<()> {
        for partition in &self.partitions {
            check_name("index", partition)?;
        }
        for row in self.includes.iter().chain(&self.excludes) {
            check_name("frame", &row.category)?;
        }
        let first = self.partitions.first().map(String::as_str).unwrap_or("");
        self.conjunction_for(first)?;
        Ok(())
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<()> {
    if NAME.is_match(name) {
        Ok(())
    } else {
        Err(MindyError::InvalidName { kind, name: name.to_owned() })
    }
}
