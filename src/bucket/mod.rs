//! Bucket keys
//!
//! Identifies stored time-series buckets and resolves request destinations:
//!
//! - **key**: the composite `items:categories` key
//! - **timeframe**: timeframe parsing and the table of materialized timeframes
//! - **resolver**: destination parsing, validation and timeframe canonicalization
//!
//! # Example
//!
//! ```rust
//! use chronicle_query::bucket::{canonicalize_timeframe, resolve, validate, TimeframeTable};
//!
//! let mut key = resolve("AAPL,TSLA/5Min/OHLCV").unwrap();
//! validate(&key).unwrap();
//!
//! let tf = canonicalize_timeframe(&mut key, &TimeframeTable::default()).unwrap();
//! assert_eq!(tf.queryable.to_string(), "1Min");
//! assert_eq!(key.timeframe(), "1Min");
//! ```

mod error;
mod key;
mod resolver;
mod timeframe;

pub use error::{KeyError, KeyResult};
pub use key::{BucketKey, ATTRIBUTE_GROUP, DEFAULT_CATEGORIES, SYMBOL, TIMEFRAME};
pub use resolver::{canonicalize_timeframe, resolve, validate, CanonicalTimeframe};
pub use timeframe::{TimeUnit, Timeframe, TimeframeTable};
