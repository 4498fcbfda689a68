//! SQL front end
//!
//! A request may carry a SQL statement instead of a structured destination:
//!
//! - **AST**: statement abstract syntax tree types
//! - **Parser**: parse statement strings into the AST
//! - **Statement**: validate and materialize against storage
//!
//! # Query Language
//!
//! ```text
//! SELECT * | item [, item ...] FROM '<bucket key>'
//! [WHERE column op number [AND ...]]
//! [LIMIT n]
//! ```
//!
//! # Example
//!
//! ```rust
//! use chronicle_query::bucket::BucketKey;
//! use chronicle_query::query::{parse_query, ExecutableStatement};
//! use chronicle_query::storage::{Column, ColumnSeries, MemoryStore};
//!
//! let store = MemoryStore::default();
//! let bars = ColumnSeries::with_epoch(vec![60, 120])
//!     .column("Close", Column::Float64(vec![1.0, 3.0]));
//! store.insert(&BucketKey::parse("AAPL/1Min/OHLCV").unwrap(), bars).unwrap();
//!
//! let ast = parse_query("SELECT AVG(Close) AS mean FROM 'AAPL/1Min/OHLCV'").unwrap();
//! let statement = ExecutableStatement::new(ast).unwrap();
//! let result = statement.materialize(&store, &store).unwrap();
//! assert_eq!(result.get("mean"), Some(&Column::Float64(vec![2.0])));
//! ```

mod ast;
mod error;
mod parser;
mod statement;

pub use ast::{AggregationFunc, Filter, Operator, Query, SelectItem, WILDCARD};
pub use error::{QueryError, QueryResult};
pub use parser::parse_query;
pub use statement::ExecutableStatement;
