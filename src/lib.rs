//! mindy – a Multi INDex proxY for Pilosa.
//!
//! mindy sits in front of a Pilosa instance holding several indexes whose
//! columns are distinct but whose rows all mean the same thing. A single
//! request names:
//! * the set of indexes to query,
//! * a list of (row, frame) pairs to include,
//! * a list of (row, frame) pairs to exclude,
//! * the conjunction (`and` or `or`) deciding whether the includes are
//!   intersected or unioned.
//!
//! The same bitmap expression is built for every index, the indexes are
//! queried concurrently (but never more than a configured number at a time)
//! and the matching columns come back keyed by index.
//!
//! ## Modules
//! * [`request`] – The request shape and its validation.
//! * [`query`] – Builds the per-index expression and renders it as PQL.
//! * [`limiter`] – Admission gate bounding concurrent Pilosa queries.
//! * [`executor`] – Runs the request against one index.
//! * [`coordinator`] – Fans out over the indexes, fails fast, aggregates.
//! * [`results`] – The shared accumulator and the frozen response.
//! * [`engine`] – The [`engine::Engine`] trait the core talks to.
//! * [`pilosa`] – The HTTP implementation of that trait.
//! * [`memory`] – An in-process implementation over roaring bitmaps.
//! * [`server`] / [`client`] – The `/mindy` HTTP endpoint and a client for it.
//! * [`config`] – Layered settings (defaults, file, environment, flags).
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use mindy::{Coordinator, Limiter, MemoryEngine, Request, Row, request::Conjunction};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let engine = MemoryEngine::new();
//! for col in [1, 2] {
//!     engine.set_bit("p1", "f1", 0, col).unwrap();
//!     engine.set_bit("p1", "f2", 0, col).unwrap();
//! }
//! let coordinator = Coordinator::new(Arc::new(engine), Limiter::new(2).unwrap());
//! let request = Request::new(
//!     vec!["p1".into()],
//!     vec![Row::new(0, "f1"), Row::new(0, "f2")],
//!     vec![],
//!     Conjunction::And,
//! );
//! let results = coordinator.execute(request).await.unwrap();
//! assert_eq!(results.get("p1"), Some(&[1, 2][..]));
//! # });
//! ```

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

pub mod client;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod memory;
pub mod pilosa;
pub mod query;
pub mod request;
pub mod results;
pub mod server;

pub use coordinator::Coordinator;
pub use error::{MindyError, Result};
pub use limiter::Limiter;
pub use memory::MemoryEngine;
pub use pilosa::PilosaClient;
pub use request::{Request, Row};
pub use results::Results;

// hashmaps keyed by index and frame names
pub type NameHasher = BuildHasherDefault<SeaHasher>;
