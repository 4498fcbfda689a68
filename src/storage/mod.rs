//! Storage collaborators
//!
//! The query layer reads through three narrow contracts and never touches
//! bucket files directly:
//!
//! - **types**: columnar record sets (`Column`, `ColumnSeries`) and per-read maps
//! - **plan**: query plans and parse results
//! - **engine**: the `Catalog`, `QueryEngine` and `Reader` traits
//! - **memory**: an in-memory store implementing those traits
//! - **loader**: CSV seeding for the in-memory store
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Read Path:
//!   QueryPlan → QueryEngine::parse → Reader::read → ColumnSeriesMap + PrevTimestampMap
//! ```
//!
//! # Example
//!
//! ```rust
//! use chronicle_query::bucket::BucketKey;
//! use chronicle_query::storage::{Column, ColumnSeries, MemoryStore, QueryEngine, QueryPlan};
//!
//! let store = MemoryStore::default();
//! let key = BucketKey::parse("AAPL/1Min/OHLCV").unwrap();
//! let bars = ColumnSeries::with_epoch(vec![60, 120])
//!     .column("Close", Column::Float64(vec![1.0, 2.0]));
//! store.insert(&key, bars).unwrap();
//!
//! let mut plan = QueryPlan::new();
//! plan.add_target_key(key.clone());
//! let parsed = store.parse(&plan).unwrap();
//! let (series, _prev) = store.new_reader(parsed).unwrap().read().unwrap();
//! assert_eq!(series[&key].len(), 2);
//! ```

pub mod engine;
pub mod error;
pub mod loader;
pub mod memory;
pub mod plan;
pub mod types;

// Re-export commonly used types
pub use engine::{Catalog, QueryEngine, Reader};
pub use error::{StorageError, StorageResult, NO_FILES_RETURNED};
pub use loader::{load_dir, parse_bucket_csv, LoadReport};
pub use memory::MemoryStore;
pub use plan::{Direction, ParseResult, QueryPlan, RowLimit};
pub use types::{Column, ColumnSeries, ColumnSeriesMap, PrevTimestampMap, EPOCH};
