//! Execution bridge
//!
//! Turns one structured request into a storage plan and runs it:
//!
//! ```text
//! key ─▶ canonicalize timeframe ─▶ QueryPlan ─▶ engine.parse ─▶ reader.read
//! ```

use crate::bucket::{self, BucketKey, KeyError};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::DataService;
use crate::storage::{ColumnSeriesMap, Direction, PrevTimestampMap, QueryPlan, StorageError};
use chrono::{DateTime, FixedOffset, TimeZone};

impl DataService {
    /// Read the buckets named by `key` within `[time_start, time_end]`
    ///
    /// Zero bounds leave that side of the range open; a bound outside the
    /// representable time range is a validation error. A non-zero
    /// `limit_count` keeps the first records when `ascending`, else the
    /// last, scaled to the timeframe storage actually serves.
    ///
    /// A plan matching nothing reports [`ServiceError::EmptyResult`].
    pub fn execute(
        &self,
        key: &BucketKey,
        time_start: i64,
        time_end: i64,
        limit_count: usize,
        ascending: bool,
    ) -> ServiceResult<(ColumnSeriesMap, PrevTimestampMap)> {
        let mut key = key.clone();
        let timeframes = self.catalog.timeframes();
        let tf = bucket::canonicalize_timeframe(&mut key, timeframes)?;

        let mut plan = QueryPlan::new();
        plan.add_target_key(key.clone());
        if limit_count != 0 {
            let direction = if ascending {
                Direction::First
            } else {
                Direction::Last
            };
            let count = timeframes.queryable_nrecords(&tf.requested, &tf.queryable, limit_count);
            plan.set_row_limit(direction, count);
        }
        plan.set_range(
            self.local_time("timeStart", time_start)?,
            self.local_time("timeEnd", time_end)?,
        );

        let parsed = match self.engine.parse(&plan) {
            Ok(parsed) => parsed,
            Err(StorageError::NoFilesReturned) => {
                tracing::info!(key = %key, "No files returned from query parse");
                return Err(ServiceError::EmptyResult);
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Parsing query failed");
                return Err(e.into());
            }
        };

        let mut reader = self.engine.new_reader(parsed).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Unable to create reader");
            ServiceError::from(e)
        })?;
        let (series, prev) = reader.read().map_err(|e| {
            tracing::error!(key = %key, error = %e, "Reading query results failed");
            ServiceError::from(e)
        })?;

        tracing::debug!(
            key = %key,
            requested = %tf.requested,
            queryable = %tf.queryable,
            buckets = series.len(),
            "Executed query"
        );
        Ok((series, prev))
    }

    fn local_time(
        &self,
        bound: &str,
        epoch: i64,
    ) -> ServiceResult<Option<DateTime<FixedOffset>>> {
        if epoch == 0 {
            return Ok(None);
        }
        self.timezone
            .timestamp_opt(epoch, 0)
            .single()
            .map(Some)
            .ok_or_else(|| {
                KeyError::Validation(format!("{} {} is out of range", bound, epoch)).into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing;

    fn key(s: &str) -> BucketKey {
        BucketKey::parse(s).unwrap()
    }

    fn epochs(series: &ColumnSeriesMap, k: &str) -> Vec<i64> {
        series[&key(k)].epoch().unwrap().to_vec()
    }

    #[test]
    fn test_execute_range() {
        let (service, _) = testing::service();
        let (series, _) = service
            .execute(&key("AAPL/1Min/OHLCV"), 120, 240, 0, false)
            .unwrap();
        assert_eq!(epochs(&series, "AAPL/1Min/OHLCV"), vec![120, 180, 240]);
    }

    #[test]
    fn test_execute_limit_direction() {
        let (service, _) = testing::service();

        let (last, _) = service
            .execute(&key("AAPL/1Min/OHLCV"), 0, 0, 2, false)
            .unwrap();
        assert_eq!(epochs(&last, "AAPL/1Min/OHLCV"), vec![300, 360]);

        let (first, _) = service
            .execute(&key("AAPL/1Min/OHLCV"), 0, 0, 2, true)
            .unwrap();
        assert_eq!(epochs(&first, "AAPL/1Min/OHLCV"), vec![60, 120]);
    }

    #[test]
    fn test_execute_canonicalizes_timeframe() {
        let (service, _) = testing::service();
        // 5Min is served from 1Min, so one requested record is five stored ones
        let (series, _) = service
            .execute(&key("AAPL/5Min/OHLCV"), 0, 0, 1, false)
            .unwrap();
        assert_eq!(
            epochs(&series, "AAPL/1Min/OHLCV"),
            vec![120, 180, 240, 300, 360]
        );
    }

    #[test]
    fn test_execute_no_match_is_empty_result() {
        let (service, _) = testing::service();
        let err = service
            .execute(&key("MSFT/1Min/OHLCV"), 0, 0, 0, false)
            .unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn test_execute_bad_timeframe_is_validation() {
        let (service, counters) = testing::service();
        let err = service
            .execute(&key("AAPL/7Sec/OHLCV"), 0, 0, 0, false)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(counters.parses(), 0);
    }

    #[test]
    fn test_local_time_zero_is_open() {
        let (service, _) = testing::service();
        assert!(service.local_time("timeStart", 0).unwrap().is_none());
        assert_eq!(
            service.local_time("timeStart", 60).unwrap().unwrap().timestamp(),
            60
        );
    }

    #[test]
    fn test_execute_out_of_range_bound_is_validation() {
        let (service, counters) = testing::service();
        let err = service
            .execute(&key("AAPL/1Min/OHLCV"), i64::MAX, 0, 0, false)
            .unwrap_err();
        match err {
            ServiceError::Validation(e) => assert!(e.to_string().contains("timeStart")),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(counters.parses(), 0);

        let err = service
            .execute(&key("AAPL/1Min/OHLCV"), 0, i64::MIN, 0, false)
            .unwrap_err();
        assert!(err.to_string().contains("timeEnd"));
    }
}
