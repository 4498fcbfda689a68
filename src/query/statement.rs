//! Executable SQL statements
//!
//! Validates a parsed [`Query`] and materializes it against the storage
//! collaborators.
//!
//! # Execution Pipeline
//!
//! ```text
//! Query → validate → Plan (Epoch bounds) → Read → Filter → Limit → Project | Aggregate
//! ```

use crate::bucket::{self, BucketKey, Timeframe};
use crate::query::ast::*;
use crate::query::error::{QueryError, QueryResult};
use crate::storage::{Catalog, Column, ColumnSeries, QueryEngine, QueryPlan, EPOCH};
use chrono::{Offset, TimeZone, Utc};

/// A validated statement bound to one bucket
#[derive(Debug, Clone)]
pub struct ExecutableStatement {
    query: Query,
    key: BucketKey,
}

impl ExecutableStatement {
    /// Validate a parsed statement
    pub fn new(query: Query) -> QueryResult<Self> {
        let key = bucket::resolve(&query.from)?;
        bucket::validate(&key)?;
        if key.symbols().len() != 1 {
            return Err(QueryError::Execution(format!(
                "a statement reads exactly one symbol, have: {}",
                key
            )));
        }

        let aggregated = query.select.iter().filter(|s| s.aggregation.is_some()).count();
        if aggregated > 0 && aggregated < query.select.len() {
            return Err(QueryError::InvalidAggregation(
                "cannot mix aggregated and plain columns".to_string(),
            ));
        }
        if let Some(item) = query.select.iter().find(|s| {
            s.is_wildcard() && !matches!(s.aggregation, None | Some(AggregationFunc::Count))
        }) {
            return Err(QueryError::InvalidAggregation(format!(
                "{} cannot be applied to *",
                item.aggregation.map(|a| a.to_string()).unwrap_or_default()
            )));
        }

        Ok(Self { query, key })
    }

    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Epoch bounds implied by `Epoch` conditions, inclusive
    fn epoch_bounds(&self) -> (Option<i64>, Option<i64>) {
        let mut start: Option<i64> = None;
        let mut end: Option<i64> = None;
        for f in self.query.filters.iter().filter(|f| f.column == EPOCH) {
            let v = f.value;
            let (lo, hi) = match f.op {
                Operator::Gte => (Some(v.ceil() as i64), None),
                Operator::Gt => (Some(v.floor() as i64 + 1), None),
                Operator::Lte => (None, Some(v.floor() as i64)),
                Operator::Lt => (None, Some(v.ceil() as i64 - 1)),
                Operator::Eq => (Some(v.ceil() as i64), Some(v.floor() as i64)),
                Operator::Ne => (None, None),
            };
            if let Some(lo) = lo {
                start = Some(start.map_or(lo, |s| s.max(lo)));
            }
            if let Some(hi) = hi {
                end = Some(end.map_or(hi, |e| e.min(hi)));
            }
        }
        (start, end)
    }

    /// Read the bucket and shape the result
    pub fn materialize(
        &self,
        catalog: &dyn Catalog,
        engine: &dyn QueryEngine,
    ) -> QueryResult<ColumnSeries> {
        let timeframe = Timeframe::parse(self.key.timeframe())?;
        if !catalog.timeframes().contains(&timeframe) {
            return Err(QueryError::Execution(format!(
                "timeframe {} is not materialized",
                timeframe
            )));
        }

        let utc = Utc.fix();
        let (start, end) = self.epoch_bounds();

        let mut plan = QueryPlan::new();
        plan.add_target_key(self.key.clone()).set_range(
            start.and_then(|s| utc.timestamp_opt(s, 0).single()),
            end.and_then(|e| utc.timestamp_opt(e, 0).single()),
        );

        let parsed = engine.parse(&plan)?;
        let (mut series_map, _) = engine.new_reader(parsed)?.read()?;
        let series = series_map
            .pop_first()
            .map(|(_, series)| series)
            .unwrap_or_default();

        let filtered = self.filter_rows(&series)?;
        let limited = match self.query.limit {
            Some(n) => filtered.slice(0, n),
            None => filtered,
        };

        if self.query.is_aggregate() {
            self.aggregate(&limited)
        } else {
            self.project(&limited)
        }
    }

    /// Apply the non-Epoch conditions, plus `Epoch != v`
    fn filter_rows(&self, series: &ColumnSeries) -> QueryResult<ColumnSeries> {
        let conditions: Vec<&Filter> = self
            .query
            .filters
            .iter()
            .filter(|f| f.column != EPOCH || f.op == Operator::Ne)
            .collect();
        if conditions.is_empty() {
            return Ok(series.clone());
        }

        let mut columns = Vec::with_capacity(conditions.len());
        for f in &conditions {
            let column = series
                .get(&f.column)
                .ok_or_else(|| QueryError::Execution(format!("unknown column {}", f.column)))?;
            columns.push(column);
        }

        let indices: Vec<usize> = (0..series.len())
            .filter(|&row| {
                conditions.iter().zip(&columns).all(|(f, col)| {
                    col.get_f64(row)
                        .map_or(false, |v| f.op.compare_f64(v, f.value))
                })
            })
            .collect();
        Ok(series.take(&indices))
    }

    fn project(&self, series: &ColumnSeries) -> QueryResult<ColumnSeries> {
        if self.query.select.iter().any(SelectItem::is_wildcard) {
            return Ok(series.clone());
        }

        let epochs = series.epoch().map(<[i64]>::to_vec).unwrap_or_default();
        let mut out = ColumnSeries::with_epoch(epochs);
        for item in self.query.select.iter().filter(|s| s.column != EPOCH) {
            let column = series
                .get(&item.column)
                .ok_or_else(|| QueryError::Execution(format!("unknown column {}", item.column)))?;
            out.add_column(item.output_name(), column.clone())?;
        }
        Ok(out)
    }

    fn aggregate(&self, series: &ColumnSeries) -> QueryResult<ColumnSeries> {
        let epochs = series.epoch().unwrap_or(&[]);
        let Some(&first) = epochs.first() else {
            return Ok(ColumnSeries::with_epoch(Vec::new()));
        };

        let mut out = ColumnSeries::with_epoch(vec![first]);
        for item in &self.query.select {
            let func = item
                .aggregation
                .ok_or_else(|| QueryError::InvalidAggregation(item.column.clone()))?;
            let column = if item.is_wildcard() {
                Column::Int64(vec![series.len() as i64])
            } else {
                let values = series
                    .get(&item.column)
                    .ok_or_else(|| {
                        QueryError::Execution(format!("unknown column {}", item.column))
                    })?
                    .to_f64();
                match func {
                    AggregationFunc::Count => Column::Int64(vec![values.len() as i64]),
                    func => Column::Float64(vec![func.apply(&values).unwrap_or(f64::NAN)]),
                }
            };
            out.add_column(item.output_name(), column)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_query;
    use crate::storage::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        let bars = ColumnSeries::with_epoch(vec![60, 120, 180, 240])
            .column("Open", Column::Float64(vec![1.0, 2.0, 3.0, 4.0]))
            .column("Close", Column::Float64(vec![1.5, 2.5, 3.5, 4.5]));
        store
            .insert(&BucketKey::parse("AAPL/1Min/OHLCV").unwrap(), bars)
            .unwrap();
        store
    }

    fn run(sql: &str) -> QueryResult<ColumnSeries> {
        let store = store();
        let statement = ExecutableStatement::new(parse_query(sql)?)?;
        statement.materialize(&store, &store)
    }

    #[test]
    fn test_select_star() {
        let out = run("SELECT * FROM 'AAPL/1Min/OHLCV'").unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.column_names().len(), 3);
    }

    #[test]
    fn test_epoch_range_and_projection() {
        let out =
            run("SELECT Close AS c FROM 'AAPL/1Min/OHLCV' WHERE Epoch > 60 AND Epoch <= 180")
                .unwrap();
        assert_eq!(out.epoch(), Some(&[120, 180][..]));
        assert_eq!(out.get("c"), Some(&Column::Float64(vec![2.5, 3.5])));
        assert!(out.get("Open").is_none());
    }

    #[test]
    fn test_value_filter_and_limit() {
        let out = run("SELECT Open FROM 'AAPL/1Min/OHLCV' WHERE Close > 2 LIMIT 2").unwrap();
        assert_eq!(out.epoch(), Some(&[120, 180][..]));
    }

    #[test]
    fn test_aggregates() {
        let out =
            run("SELECT MAX(Close), COUNT(*) AS n FROM 'AAPL/1Min/OHLCV' WHERE Epoch >= 120")
                .unwrap();
        assert_eq!(out.epoch(), Some(&[120][..]));
        assert_eq!(out.get("MAX(Close)"), Some(&Column::Float64(vec![4.5])));
        assert_eq!(out.get("n"), Some(&Column::Int64(vec![3])));
    }

    #[test]
    fn test_aggregate_over_no_rows() {
        let out = run("SELECT AVG(Close) FROM 'AAPL/1Min/OHLCV' WHERE Close > 100").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_mixed_aggregation_rejected() {
        let err = run("SELECT Close, AVG(Close) FROM 'AAPL/1Min/OHLCV'").unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregation(_)));

        let err = run("SELECT SUM(*) FROM 'AAPL/1Min/OHLCV'").unwrap_err();
        assert!(matches!(err, QueryError::InvalidAggregation(_)));
    }

    #[test]
    fn test_statement_needs_one_bucket() {
        let err = run("SELECT * FROM 'AAPL,TSLA/1Min/OHLCV'").unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));

        let err = run("SELECT * FROM 'AAPL//OHLCV'").unwrap_err();
        assert!(matches!(err, QueryError::Key(_)));
    }

    #[test]
    fn test_unmaterialized_timeframe() {
        let err = run("SELECT * FROM 'AAPL/5Min/OHLCV'").unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
    }

    #[test]
    fn test_unknown_bucket_or_column() {
        assert!(matches!(
            run("SELECT * FROM 'MSFT/1Min/OHLCV'"),
            Err(QueryError::Storage(_))
        ));
        assert!(matches!(
            run("SELECT Volume FROM 'AAPL/1Min/OHLCV'"),
            Err(QueryError::Execution(_))
        ));
    }
}
