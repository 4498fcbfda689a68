//! Result assembly
//!
//! Merges the per-bucket series of one request into a single dataset. The
//! first bucket (in key order) fixes the column schema; the rest are
//! appended behind it:
//!
//! ```text
//! AAPL → rows [0, 3)     data: Epoch | Open | ... (rows of AAPL, then TSLA)
//! TSLA → rows [3, 5)
//! ```

use crate::bucket::BucketKey;
use crate::service::error::{ServiceError, ServiceResult};
use crate::storage::{ColumnSeries, ColumnSeriesMap};
use serde::{Deserialize, Serialize};

/// Concatenated column data of several buckets sharing one schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiDataset {
    data: ColumnSeries,
    keys: Vec<BucketKey>,
    start_index: Vec<usize>,
    lengths: Vec<usize>,
}

impl MultiDataset {
    /// A dataset with no buckets
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dataset holding one bucket
    pub fn single(key: BucketKey, series: ColumnSeries) -> Self {
        let len = series.len();
        Self {
            data: series,
            keys: vec![key],
            start_index: vec![0],
            lengths: vec![len],
        }
    }

    /// Append a bucket's rows; its schema must match the dataset's
    pub fn append(&mut self, key: BucketKey, series: &ColumnSeries) -> ServiceResult<()> {
        if self.keys.is_empty() {
            *self = Self::single(key, series.clone());
            return Ok(());
        }
        let start = self.data.len();
        self.data
            .append(series)
            .map_err(|e| ServiceError::Execution(format!("cannot append {}: {}", key, e)))?;
        self.keys.push(key);
        self.start_index.push(start);
        self.lengths.push(series.len());
        Ok(())
    }

    /// Keys in the order their rows appear
    pub fn keys(&self) -> &[BucketKey] {
        &self.keys
    }

    /// The concatenated data
    pub fn data(&self) -> &ColumnSeries {
        &self.data
    }

    /// Rows belonging to `key`
    pub fn series_for(&self, key: &BucketKey) -> Option<ColumnSeries> {
        let idx = self.keys.iter().position(|k| k == key)?;
        let start = self.start_index[idx];
        Some(self.data.slice(start, start + self.lengths[idx]))
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Merge a request's per-bucket results in key order
pub fn assemble(series: ColumnSeriesMap) -> ServiceResult<MultiDataset> {
    let mut dataset = MultiDataset::empty();
    for (key, cs) in series {
        dataset.append(key, &cs)?;
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Column;

    fn key(s: &str) -> BucketKey {
        BucketKey::parse(s).unwrap()
    }

    fn bars(epochs: &[i64]) -> ColumnSeries {
        let close = epochs.iter().map(|e| *e as f64).collect();
        ColumnSeries::with_epoch(epochs.to_vec()).column("Close", Column::Float64(close))
    }

    #[test]
    fn test_assemble_in_key_order() {
        let mut map = ColumnSeriesMap::new();
        map.insert(key("TSLA/1Min/OHLCV"), bars(&[60, 120]));
        map.insert(key("AAPL/1Min/OHLCV"), bars(&[60, 120, 180]));

        let dataset = assemble(map).unwrap();
        assert_eq!(dataset.keys(), &[key("AAPL/1Min/OHLCV"), key("TSLA/1Min/OHLCV")]);
        assert_eq!(dataset.data().len(), 5);
        assert_eq!(
            dataset.series_for(&key("TSLA/1Min/OHLCV")).unwrap(),
            bars(&[60, 120])
        );
    }

    #[test]
    fn test_schema_mismatch_is_execution_error() {
        let mut map = ColumnSeriesMap::new();
        map.insert(key("AAPL/1Min/OHLCV"), bars(&[60]));
        map.insert(key("TSLA/1Min/OHLCV"), ColumnSeries::with_epoch(vec![60]));

        assert!(matches!(assemble(map), Err(ServiceError::Execution(_))));
    }

    #[test]
    fn test_assemble_nothing() {
        let dataset = assemble(ColumnSeriesMap::new()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.series_for(&key("AAPL/1Min/OHLCV")).is_none());
    }
}
