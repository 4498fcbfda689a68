//! # Chronicle Query
//!
//! Query dispatch and aggregation over bucketed time-series storage.
//!
//! Clients send batches of requests, each either a SQL statement or a
//! structured request naming a destination bucket key, a time range, a row
//! limit and an optional chain of aggregate function calls. The service
//! resolves keys, runs the plans against the storage collaborators, pipes the
//! results through the aggregates and assembles one dataset per request.
//!
//! ## Modules
//!
//! - [`bucket`]: bucket keys, timeframes and destination resolution
//! - [`storage`]: collaborator contracts, columnar types and an in-memory store
//! - [`pipeline`]: aggregate call parsing, registry and chain execution
//! - [`query`]: SQL parser and executable statements
//! - [`service`]: the data service (dispatch, bridge, assembly, auxiliary queries)
//! - [`api`]: HTTP surface with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use chronicle_query::bucket::BucketKey;
//! use chronicle_query::pipeline::AggregateRegistry;
//! use chronicle_query::service::{DataService, QueryRequest, ReadyState};
//! use chronicle_query::storage::{Column, ColumnSeries, MemoryStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::default());
//! store
//!     .insert(
//!         &BucketKey::parse("AAPL/1Min/OHLCV").unwrap(),
//!         ColumnSeries::with_epoch(vec![60, 120])
//!             .column("Close", Column::Float64(vec![10.0, 11.0])),
//!     )
//!     .unwrap();
//!
//! let service = DataService::new(
//!     store.clone(),
//!     store,
//!     Arc::new(AggregateRegistry::with_builtins()),
//! );
//! service.readiness().set(ReadyState::Ready);
//!
//! let requests = vec![QueryRequest::structured("AAPL/1Min/OHLCV")];
//! let envelope = service.query(Some(requests.as_slice())).unwrap();
//! assert_eq!(envelope.responses[0].result.data().len(), 2);
//! ```

pub mod api;
pub mod bucket;
pub mod config;
pub mod pipeline;
pub mod query;
pub mod service;
pub mod storage;

pub use api::{build_router, serve, ApiError, AppState};

pub use bucket::{BucketKey, KeyError, Timeframe, TimeframeTable};

pub use config::{Config, ConfigError, LoggingConfig};

pub use pipeline::{AggregateRegistry, PipelineError};

pub use query::{parse_query, ExecutableStatement, QueryError};

pub use service::{
    DataService, MultiDataset, QueryRequest, ReadyState, Readiness, ResultEnvelope, ServiceError,
    ServiceResult,
};

pub use storage::{
    Catalog, Column, ColumnSeries, MemoryStore, QueryEngine, Reader, StorageError, StorageResult,
};
