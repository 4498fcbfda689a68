//! Collaborator contracts consumed by the query layer
//!
//! ```text
//! QueryPlan ──parse──▶ ParseResult ──new_reader──▶ Reader ──read──▶ (ColumnSeriesMap, PrevTimestampMap)
//! ```
//!
//! The catalog and the engine are read-only from the caller's side and may be
//! shared across concurrent requests.

use crate::bucket::TimeframeTable;
use crate::storage::error::StorageResult;
use crate::storage::plan::{ParseResult, QueryPlan};
use crate::storage::types::{ColumnSeriesMap, PrevTimestampMap};
use std::collections::{BTreeSet, HashMap};

/// Index of which symbol/timeframe/record-format combinations are stored
pub trait Catalog: Send + Sync {
    /// Category name → item names found under it
    fn gather_categories_and_items(&self) -> HashMap<String, BTreeSet<String>>;

    /// Timeframes storage materializes
    fn timeframes(&self) -> &TimeframeTable;
}

/// Turns plans into readers
pub trait QueryEngine: Send + Sync {
    /// Match a plan against stored buckets
    ///
    /// Fails with [`StorageError::NoFilesReturned`](crate::storage::StorageError::NoFilesReturned)
    /// when nothing matches.
    fn parse(&self, plan: &QueryPlan) -> StorageResult<ParseResult>;

    fn new_reader(&self, parsed: ParseResult) -> StorageResult<Box<dyn Reader + '_>>;
}

/// Executes one parsed plan
pub trait Reader {
    fn read(&mut self) -> StorageResult<(ColumnSeriesMap, PrevTimestampMap)>;
}
