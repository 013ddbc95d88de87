//! Builds the per-index bitmap expression for a request.
//!
//! For every index the included rows are combined with `Intersect` (and) or
//! `Union` (or), and each excluded row is then subtracted in request order:
//!
//! ```text
//! Difference(Intersect(Bitmap(rowID=0, frame='f1'), Bitmap(rowID=0, frame='f2')),
//!            Bitmap(rowID=5, frame='f1'))
//! ```
//!
//! Expressions render to PQL through `Display`, which is what gets posted to
//! Pilosa.

use std::fmt;

use crate::engine::PartitionSchema;
use crate::error::{MindyError, Result};
use crate::request::{Conjunction, Request, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// All columns set for one row of one frame.
    Bitmap { frame: String, row_id: u64 },
    Intersect(Vec<Expr>),
    Union(Vec<Expr>),
    /// The first argument minus every following argument, in order.
    Difference(Vec<Expr>),
}

/// An expression bound to the index it is evaluated in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    index: String,
    expr: Expr,
}

impl Query {
    pub fn new(index: impl Into<String>, expr: Expr) -> Self {
        Self { index: index.into(), expr }
    }
    pub fn index(&self) -> &str {
        &self.index
    }
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
    /// True when no included row feeds the expression. Combining zero rows
    /// matches no column under either conjunction, and subtracting from an
    /// empty set leaves it empty, so such a query never needs an engine.
    pub fn selects_nothing(&self) -> bool {
        let combined = match &self.expr {
            Expr::Difference(args) => match args.first() {
                Some(first) => first,
                None => return true,
            },
            other => other,
        };
        matches!(combined, Expr::Intersect(args) | Expr::Union(args) if args.is_empty())
    }
}

/// Constructs the query for one index out of the request.
pub fn build_query(schema: &PartitionSchema, request: &Request) -> Result<Query> {
    let includes = bitmaps(schema, &request.includes)?;
    let excludes = bitmaps(schema, &request.excludes)?;

    let combined = match request.conjunction_for(schema.name())? {
        Conjunction::And => Expr::Intersect(includes),
        Conjunction::Or => Expr::Union(includes),
    };

    let expr = if excludes.is_empty() {
        combined
    } else {
        // the conjunction goes first, then each exclude on its own
        let mut args = Vec::with_capacity(excludes.len() + 1);
        args.push(combined);
        args.extend(excludes);
        Expr::Difference(args)
    };
    Ok(Query::new(schema.name(), expr))
}

fn bitmaps(schema: &PartitionSchema, rows: &[Row]) -> Result<Vec<Expr>> {
    rows.iter()
        .map(|row| {
            if !schema.has_frame(&row.category) {
                return Err(MindyError::UnknownCategory {
                    partition: schema.name().to_owned(),
                    category: row.category.clone(),
                });
            }
            Ok(Expr::Bitmap { frame: row.category.clone(), row_id: row.id })
        })
        .collect()
}

// ------------- PQL -------------
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bitmap { frame, row_id } => write!(f, "Bitmap(rowID={row_id}, frame='{frame}')"),
            Expr::Intersect(args) => call(f, "Intersect", args),
            Expr::Union(args) => call(f, "Union", args),
            Expr::Difference(args) => call(f, "Difference", args),
        }
    }
}

fn call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Expr]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)
    }
}
