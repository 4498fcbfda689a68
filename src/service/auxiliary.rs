//! Auxiliary queries: stored range of a bucket and the symbol list

use crate::bucket::{self, BucketKey, SYMBOL};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::request::{ListSymbolsReply, RangeLimitArgs, RangeLimitReply};
use crate::service::DataService;
use crate::storage::{Direction, QueryPlan, StorageError};

impl DataService {
    /// First and last stored epochs of the bucket named by `args.destination`
    ///
    /// A multi-symbol destination reports the first bucket in key order.
    pub fn range_limit(&self, args: Option<&RangeLimitArgs>) -> ServiceResult<RangeLimitReply> {
        self.check_ready()?;
        let args = args.ok_or(ServiceError::MissingArgs)?;
        let key = bucket::resolve(&args.destination)?;

        let start = self.edge_epoch(&key, Direction::First)?;
        let end = self.edge_epoch(&key, Direction::Last)?;
        Ok(RangeLimitReply { start, end })
    }

    /// One-record read from either end of the bucket
    fn edge_epoch(&self, key: &BucketKey, direction: Direction) -> ServiceResult<i64> {
        let mut plan = QueryPlan::new();
        plan.add_target_key(key.clone()).set_row_limit(direction, 1);

        let parsed = match self.engine.parse(&plan) {
            Ok(parsed) => parsed,
            Err(StorageError::NoFilesReturned) => {
                tracing::info!(key = %key, ?direction, "No files returned from query parse");
                return Err(ServiceError::EmptyResult);
            }
            Err(e) => {
                tracing::error!(key = %key, ?direction, error = %e, "Range limit parse failed");
                return Err(e.into());
            }
        };
        let mut reader = self.engine.new_reader(parsed).map_err(|e| {
            tracing::error!(key = %key, ?direction, error = %e, "Unable to create reader");
            ServiceError::from(e)
        })?;
        let (series, _) = reader.read().map_err(|e| {
            tracing::error!(key = %key, ?direction, error = %e, "Range limit read failed");
            ServiceError::from(e)
        })?;

        series
            .values()
            .next()
            .and_then(|cs| cs.epoch())
            .and_then(|epochs| epochs.first().copied())
            .ok_or(ServiceError::EmptyResult)
    }

    /// Every stored symbol, sorted
    pub fn list_symbols(&self) -> ServiceResult<ListSymbolsReply> {
        self.check_ready()?;
        let results = self
            .catalog
            .gather_categories_and_items()
            .remove(SYMBOL)
            .map(|symbols| symbols.into_iter().collect())
            .unwrap_or_default();
        Ok(ListSymbolsReply { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AggregateRegistry;
    use crate::service::testing;
    use crate::service::ReadyState;
    use crate::storage::{MemoryStore, ParseResult, QueryEngine, Reader, StorageResult};
    use std::sync::Arc;

    /// Plans always match but no reader can be opened
    struct UnreadableEngine;

    impl QueryEngine for UnreadableEngine {
        fn parse(&self, plan: &QueryPlan) -> StorageResult<ParseResult> {
            Ok(ParseResult {
                keys: plan.targets().to_vec(),
                row_limit: None,
                start_epoch: None,
                end_epoch: None,
            })
        }

        fn new_reader(&self, _parsed: ParseResult) -> StorageResult<Box<dyn Reader + '_>> {
            Err(StorageError::Schema("segment unreadable".to_string()))
        }
    }

    fn args(destination: &str) -> RangeLimitArgs {
        RangeLimitArgs {
            destination: destination.to_string(),
        }
    }

    #[test]
    fn test_range_limit() {
        let (service, _) = testing::service();
        let reply = service.range_limit(Some(&args("AAPL/1Min/OHLCV"))).unwrap();
        assert_eq!(reply, RangeLimitReply { start: 60, end: 360 });
    }

    #[test]
    fn test_range_limit_missing_bucket() {
        let (service, _) = testing::service();
        let err = service
            .range_limit(Some(&args("MSFT/1Min/OHLCV")))
            .unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn test_range_limit_reader_failure_is_hard_error() {
        let service = DataService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(UnreadableEngine),
            Arc::new(AggregateRegistry::new()),
        );
        service.readiness().set(ReadyState::Ready);

        let err = service
            .range_limit(Some(&args("AAPL/1Min/OHLCV")))
            .unwrap_err();
        assert!(!err.is_empty_result());
        assert!(matches!(err, ServiceError::Storage(StorageError::Schema(_))));
    }

    #[test]
    fn test_range_limit_bad_destination() {
        let (service, counters) = testing::service();
        let err = service.range_limit(Some(&args("AAPL"))).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(counters.parses(), 0);
    }

    #[test]
    fn test_range_limit_gate_and_args() {
        let (service, counters) = testing::service();
        assert!(matches!(
            service.range_limit(None),
            Err(ServiceError::MissingArgs)
        ));

        service.readiness().set(ReadyState::NotReady);
        assert!(matches!(
            service.range_limit(Some(&args("AAPL/1Min/OHLCV"))),
            Err(ServiceError::NotReady)
        ));
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn test_list_symbols_sorted() {
        let (service, _) = testing::service();
        let reply = service.list_symbols().unwrap();
        assert_eq!(reply.results, vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_list_symbols_not_ready() {
        let (service, counters) = testing::service();
        service.readiness().set(ReadyState::NotReady);
        assert!(matches!(service.list_symbols(), Err(ServiceError::NotReady)));
        assert_eq!(counters.total(), 0);
    }
}
