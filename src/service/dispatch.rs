//! Batch query dispatch
//!
//! Requests run in order and the first failure aborts the batch. A
//! structured request whose plan matches nothing yields an empty dataset
//! instead of failing.

use crate::bucket::{self, BucketKey};
use crate::pipeline::run_chain;
use crate::query::{parse_query, ExecutableStatement};
use crate::service::assemble::{assemble, MultiDataset};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::request::{QueryRequest, QueryResponse, ResultEnvelope};
use crate::service::{DataService, VERSION};

/// Category of the synthetic key a SQL result is filed under
const SQL_CATEGORY: &str = "SQL";

impl DataService {
    /// Run a batch of requests
    ///
    /// `None` means the caller sent no arguments at all.
    pub fn query(&self, requests: Option<&[QueryRequest]>) -> ServiceResult<ResultEnvelope> {
        self.check_ready()?;
        let requests = requests.ok_or(ServiceError::MissingArgs)?;

        let mut responses = Vec::with_capacity(requests.len());
        for (idx, request) in requests.iter().enumerate() {
            let result = match request {
                QueryRequest::Sql { statement } => self.run_sql(statement),
                QueryRequest::Structured {
                    destination,
                    time_start,
                    time_end,
                    limit_record_count,
                    time_order_ascending,
                    functions,
                } => self.run_structured(
                    destination,
                    *time_start,
                    *time_end,
                    *limit_record_count,
                    *time_order_ascending,
                    functions,
                ),
            };
            let result = result.map_err(|e| {
                tracing::warn!(request = idx, error = %e, "Query request failed");
                e
            })?;
            responses.push(QueryResponse { result });
        }

        Ok(ResultEnvelope {
            responses,
            version: VERSION.to_string(),
            timezone: self.timezone_name(),
        })
    }

    fn run_sql(&self, statement: &str) -> ServiceResult<MultiDataset> {
        let query = parse_query(statement)?;
        let executable = ExecutableStatement::new(query)?;
        let series = executable.materialize(self.catalog.as_ref(), self.engine.as_ref())?;
        tracing::debug!(statement, rows = series.len(), "Executed SQL statement");
        Ok(MultiDataset::single(
            BucketKey::synthetic(statement, SQL_CATEGORY),
            series,
        ))
    }

    fn run_structured(
        &self,
        destination: &str,
        time_start: i64,
        time_end: i64,
        limit_record_count: usize,
        ascending: bool,
        functions: &[String],
    ) -> ServiceResult<MultiDataset> {
        let key = bucket::resolve(destination)?;
        bucket::validate(&key)?;

        let executed = self.execute(&key, time_start, time_end, limit_record_count, ascending);
        let mut series = match executed {
            Ok((series, _prev)) => series,
            Err(e) if e.is_empty_result() => return Ok(MultiDataset::empty()),
            Err(e) => return Err(e),
        };

        if !functions.is_empty() {
            for cs in series.values_mut() {
                *cs = run_chain(&self.registry, functions, std::mem::take(cs))?;
            }
        }

        assemble(series)
    }
}
