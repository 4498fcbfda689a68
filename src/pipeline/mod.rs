//! Aggregate pipeline
//!
//! Parses aggregate call strings and runs them as a chain over one bucket's
//! column series:
//!
//! - **call**: call tokenizer (`Name('literal', param, ...)`)
//! - **args**: positional binding of call parameters to declared roles
//! - **aggregate**: the `Aggregate` / `AggregateFactory` contracts
//! - **registry**: case-insensitive name → factory lookup
//! - **builtins**: summaries, EMA and Resample
//! - **chain**: sequential chain execution
//!
//! # Example
//!
//! ```rust
//! use chronicle_query::pipeline::{run_chain, AggregateRegistry};
//! use chronicle_query::storage::{Column, ColumnSeries};
//!
//! let registry = AggregateRegistry::with_builtins();
//! let bars = ColumnSeries::with_epoch(vec![0, 60, 120])
//!     .column("Close", Column::Float64(vec![1.0, 2.0, 3.0]));
//!
//! let out = run_chain(&registry, &["EMA('2', Close)", "Last(EMA)"], bars).unwrap();
//! assert_eq!(out.len(), 1);
//! ```

mod aggregate;
mod args;
mod builtins;
mod call;
mod chain;
mod error;
mod registry;

pub use aggregate::{Aggregate, AggregateFactory};
pub use args::ArgumentMap;
pub use builtins::{Ema, Resample, Summary};
pub use call::{parse_call, AggregateCall};
pub use chain::run_chain;
pub use error::{ArgumentError, PipelineError, PipelineResult};
pub use registry::AggregateRegistry;
