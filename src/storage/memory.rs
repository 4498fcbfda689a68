//! In-memory bucket store
//!
//! Reference implementation of [`Catalog`] and [`QueryEngine`]. Buckets are
//! held as whole [`ColumnSeries`] keyed by single-symbol [`BucketKey`]s in the
//! default `Symbol/Timeframe/AttributeGroup` layout.

use crate::bucket::{
    self, BucketKey, Timeframe, TimeframeTable, ATTRIBUTE_GROUP, SYMBOL, TIMEFRAME,
};
use crate::storage::engine::{Catalog, QueryEngine, Reader};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::plan::{Direction, ParseResult, QueryPlan};
use crate::storage::types::{ColumnSeries, ColumnSeriesMap, PrevTimestampMap};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard};

/// Bucket store backed by a map of column series
pub struct MemoryStore {
    timeframes: TimeframeTable,
    buckets: RwLock<BTreeMap<BucketKey, ColumnSeries>>,
}

impl MemoryStore {
    /// Create an empty store materializing the given timeframes
    pub fn new(timeframes: TimeframeTable) -> Self {
        Self {
            timeframes,
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    fn read_buckets(&self) -> RwLockReadGuard<'_, BTreeMap<BucketKey, ColumnSeries>> {
        self.buckets.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Normalize a key to the default category layout
    fn normalize(symbol: &str, timeframe: &str, record_format: &str) -> StorageResult<BucketKey> {
        Ok(BucketKey::parse(&format!(
            "{}/{}/{}",
            symbol, timeframe, record_format
        ))?)
    }

    /// Store (or replace) one bucket
    ///
    /// The key must name exactly one symbol and a materialized timeframe, and
    /// the series must carry an ascending Epoch column.
    pub fn insert(&self, key: &BucketKey, series: ColumnSeries) -> StorageResult<()> {
        bucket::validate(key)?;
        let symbols = key.symbols();
        if symbols.len() != 1 {
            return Err(StorageError::InvalidBucket(format!(
                "bucket must name exactly one symbol: {}",
                key
            )));
        }
        let tf = Timeframe::parse(key.timeframe())?;
        if !self.timeframes.contains(&tf) {
            return Err(StorageError::InvalidBucket(format!(
                "timeframe {} is not materialized",
                tf
            )));
        }
        let epochs = series
            .epoch()
            .ok_or_else(|| StorageError::Schema("series has no Epoch column".to_string()))?;
        if epochs.windows(2).any(|w| w[0] > w[1]) {
            return Err(StorageError::Schema(format!(
                "Epoch column of {} is not ascending",
                key
            )));
        }

        let key = Self::normalize(&symbols[0], &tf.to_string(), key.record_format())?;
        tracing::debug!(bucket = %key, rows = series.len(), "Storing bucket");
        self.buckets
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, series);
        Ok(())
    }

    /// Number of stored buckets
    pub fn bucket_count(&self) -> usize {
        self.read_buckets().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(TimeframeTable::default())
    }
}

impl Catalog for MemoryStore {
    fn gather_categories_and_items(&self) -> HashMap<String, BTreeSet<String>> {
        let mut result: HashMap<String, BTreeSet<String>> = HashMap::new();
        for key in self.read_buckets().keys() {
            for category in [SYMBOL, TIMEFRAME, ATTRIBUTE_GROUP] {
                result
                    .entry(category.to_string())
                    .or_default()
                    .insert(key.item_in_category(category).to_string());
            }
        }
        result
    }

    fn timeframes(&self) -> &TimeframeTable {
        &self.timeframes
    }
}

impl QueryEngine for MemoryStore {
    fn parse(&self, plan: &QueryPlan) -> StorageResult<ParseResult> {
        if plan.targets().is_empty() {
            return Err(StorageError::NoTargetKey);
        }

        let buckets = self.read_buckets();
        let mut keys = BTreeSet::new();
        for target in plan.targets() {
            for symbol in target.symbols() {
                let key = Self::normalize(&symbol, target.timeframe(), target.record_format())?;
                if buckets.contains_key(&key) {
                    keys.insert(key);
                }
            }
        }

        if keys.is_empty() {
            return Err(StorageError::NoFilesReturned);
        }

        Ok(ParseResult {
            keys: keys.into_iter().collect(),
            row_limit: plan.row_limit(),
            start_epoch: plan.start().map(|t| t.timestamp()),
            end_epoch: plan.end().map(|t| t.timestamp()),
        })
    }

    fn new_reader(&self, parsed: ParseResult) -> StorageResult<Box<dyn Reader + '_>> {
        Ok(Box::new(MemoryReader {
            store: self,
            parsed,
        }))
    }
}

/// Reader over a [`MemoryStore`]
struct MemoryReader<'a> {
    store: &'a MemoryStore,
    parsed: ParseResult,
}

impl Reader for MemoryReader<'_> {
    fn read(&mut self) -> StorageResult<(ColumnSeriesMap, PrevTimestampMap)> {
        let buckets = self.store.read_buckets();
        let mut series_map = ColumnSeriesMap::new();
        let mut prev_map = PrevTimestampMap::new();

        for key in &self.parsed.keys {
            let series = buckets
                .get(key)
                .ok_or_else(|| StorageError::BucketNotFound(key.to_string()))?;
            let epochs = series
                .epoch()
                .ok_or_else(|| StorageError::Schema(format!("{} has no Epoch column", key)))?;

            let mut indices: Vec<usize> = (0..epochs.len())
                .filter(|&i| self.parsed.in_range(epochs[i]))
                .collect();

            if let Some(limit) = self.parsed.row_limit {
                if indices.len() > limit.count {
                    indices = match limit.direction {
                        Direction::First => indices[..limit.count].to_vec(),
                        Direction::Last => indices[indices.len() - limit.count..].to_vec(),
                    };
                }
            }

            if let Some(&first) = indices.first() {
                if first > 0 {
                    prev_map.insert(key.clone(), epochs[first - 1]);
                }
            }
            series_map.insert(key.clone(), series.take(&indices));
        }

        Ok((series_map, prev_map))
    }
}
