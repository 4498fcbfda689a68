//! Columnar data types shared by the storage collaborators and the query layer
//!
//! - `Column`: one typed column of values
//! - `ColumnSeries`: the record set for exactly one bucket
//! - `ColumnSeriesMap` / `PrevTimestampMap`: per-bucket results of one read

use crate::bucket::BucketKey;
use crate::storage::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Name of the time axis column (Unix epoch seconds)
pub const EPOCH: &str = "Epoch";

/// Per-bucket column data of one read, iterated in lexical key order
pub type ColumnSeriesMap = BTreeMap<BucketKey, ColumnSeries>;

/// Epoch of the record immediately preceding each bucket's first returned record
pub type PrevTimestampMap = BTreeMap<BucketKey, i64>;

/// A single typed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum Column {
    /// 64-bit integers (Epoch, counts)
    Int64(Vec<i64>),
    /// 64-bit floats (prices, volumes, derived values)
    Float64(Vec<f64>),
}

impl Column {
    /// Number of values in the column
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Type label used in schemas and wire output
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Int64(_) => "int64",
            Column::Float64(_) => "float64",
        }
    }

    /// Value at `idx` widened to f64
    pub fn get_f64(&self, idx: usize) -> Option<f64> {
        match self {
            Column::Int64(v) => v.get(idx).map(|x| *x as f64),
            Column::Float64(v) => v.get(idx).copied(),
        }
    }

    /// All values widened to f64
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Column::Int64(v) => v.iter().map(|x| *x as f64).collect(),
            Column::Float64(v) => v.clone(),
        }
    }

    /// Copy of the rows at the given indices
    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(indices.iter().map(|&i| v[i]).collect()),
            Column::Float64(v) => Column::Float64(indices.iter().map(|&i| v[i]).collect()),
        }
    }

    /// Append another column of the same type
    fn extend_from(&mut self, other: &Column) -> StorageResult<()> {
        match (self, other) {
            (Column::Int64(a), Column::Int64(b)) => a.extend_from_slice(b),
            (Column::Float64(a), Column::Float64(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(StorageError::Schema(format!(
                    "cannot append {} column to {} column",
                    b.type_name(),
                    a.type_name()
                )))
            }
        }
        Ok(())
    }
}

/// In-memory columnar record set for one bucket
///
/// All columns share one length. Column order is preserved as inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSeries {
    column_names: Vec<String>,
    columns: HashMap<String, Column>,
}

impl ColumnSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a series holding only an Epoch column
    pub fn with_epoch(epochs: Vec<i64>) -> Self {
        let mut cs = Self::new();
        cs.column_names.push(EPOCH.to_string());
        cs.columns.insert(EPOCH.to_string(), Column::Int64(epochs));
        cs
    }

    /// Builder: add a column, panicking on a length mismatch
    ///
    /// Intended for fixtures; production paths use [`ColumnSeries::add_column`].
    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        if let Err(e) = self.add_column(name, column) {
            panic!("ColumnSeries::column: {}", e);
        }
        self
    }

    /// Add or replace a column
    ///
    /// Replacing keeps the column's original position.
    pub fn add_column(&mut self, name: impl Into<String>, column: Column) -> StorageResult<()> {
        let name = name.into();
        let others = self.column_names.iter().filter(|n| **n != name).count();
        if others > 0 && column.len() != self.len() {
            return Err(StorageError::Schema(format!(
                "column {} has {} rows, series has {}",
                name,
                column.len(),
                self.len()
            )));
        }
        if !self.columns.contains_key(&name) {
            self.column_names.push(name.clone());
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Look up a column by name
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// The Epoch column, if present and integer-typed
    pub fn epoch(&self) -> Option<&[i64]> {
        match self.columns.get(EPOCH) {
            Some(Column::Int64(v)) => Some(v),
            _ => None,
        }
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Ordered (name, type) pairs
    pub fn schema(&self) -> Vec<(String, &'static str)> {
        self.column_names
            .iter()
            .map(|n| (n.clone(), self.columns[n].type_name()))
            .collect()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.column_names
            .first()
            .and_then(|n| self.columns.get(n))
            .map(Column::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the rows at the given indices
    pub fn take(&self, indices: &[usize]) -> ColumnSeries {
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), col.take(indices)))
            .collect();
        ColumnSeries {
            column_names: self.column_names.clone(),
            columns,
        }
    }

    /// Rows `[start, end)`, clamped to the series length
    pub fn slice(&self, start: usize, end: usize) -> ColumnSeries {
        let end = end.min(self.len());
        let start = start.min(end);
        let indices: Vec<usize> = (start..end).collect();
        self.take(&indices)
    }

    /// Keep only the named columns (Epoch is always kept, first)
    pub fn project(&self, names: &[String]) -> StorageResult<ColumnSeries> {
        let mut out = ColumnSeries::new();
        if let Some(epoch) = self.columns.get(EPOCH) {
            out.add_column(EPOCH, epoch.clone())?;
        }
        for name in names.iter().filter(|n| n.as_str() != EPOCH) {
            let col = self
                .columns
                .get(name)
                .ok_or_else(|| StorageError::Schema(format!("unknown column {}", name)))?;
            out.add_column(name.clone(), col.clone())?;
        }
        Ok(out)
    }

    /// Append the rows of `other`; both series must have the same schema
    pub fn append(&mut self, other: &ColumnSeries) -> StorageResult<()> {
        if self.schema() != other.schema() {
            return Err(StorageError::Schema(format!(
                "schema mismatch: {:?} vs {:?}",
                self.schema(),
                other.schema()
            )));
        }
        for name in &self.column_names {
            let src = &other.columns[name];
            if let Some(dst) = self.columns.get_mut(name) {
                dst.extend_from(src)?;
            }
        }
        Ok(())
    }
}
