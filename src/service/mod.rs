//! Query dispatch service
//!
//! The [`DataService`] context owns the collaborators every query-class
//! operation needs and exposes them as three operations:
//!
//! - **query**: run a batch of SQL or structured requests
//! - **range_limit**: first and last stored epochs of a bucket
//! - **list_symbols**: every stored symbol
//!
//! # Architecture
//!
//! ```text
//! BatchRequest ──▶ dispatch ──┬── Sql ─────────▶ parse → statement → materialize ──┐
//!                             └── Structured ──▶ resolve → validate → bridge        │
//!                                                  → pipeline (per bucket)          │
//!                                                  → assemble ──────────────────────┴─▶ ResultEnvelope
//! ```
//!
//! Every operation checks the readiness gate before touching a collaborator.

mod assemble;
mod auxiliary;
mod bridge;
mod dispatch;
mod error;
mod readiness;
mod request;

pub use assemble::{assemble, MultiDataset};
pub use error::{ServiceError, ServiceResult};
pub use readiness::{ReadyState, Readiness};
pub use request::{
    ListSymbolsReply, QueryRequest, QueryResponse, RangeLimitArgs, RangeLimitReply,
    ResultEnvelope,
};

use crate::pipeline::AggregateRegistry;
use crate::storage::{Catalog, QueryEngine};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;

/// Server version reported in every result envelope
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared context of the query-class operations
#[derive(Clone)]
pub struct DataService {
    catalog: Arc<dyn Catalog>,
    engine: Arc<dyn QueryEngine>,
    registry: Arc<AggregateRegistry>,
    readiness: Readiness,
    timezone: FixedOffset,
}

impl DataService {
    /// Create a service in the UTC timezone with its gate closed
    pub fn new(
        catalog: Arc<dyn Catalog>,
        engine: Arc<dyn QueryEngine>,
        registry: Arc<AggregateRegistry>,
    ) -> Self {
        Self {
            catalog,
            engine,
            registry,
            readiness: Readiness::new(),
            timezone: Utc.fix(),
        }
    }

    /// Use `timezone` when converting request epochs
    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn timezone(&self) -> FixedOffset {
        self.timezone
    }

    /// Timezone label for replies: `UTC` or `+HH:MM`
    pub fn timezone_name(&self) -> String {
        if self.timezone.local_minus_utc() == 0 {
            "UTC".to_string()
        } else {
            self.timezone.to_string()
        }
    }

    pub fn registry(&self) -> &AggregateRegistry {
        &self.registry
    }

    fn check_ready(&self) -> ServiceResult<()> {
        if self.readiness.is_ready() {
            Ok(())
        } else {
            Err(ServiceError::NotReady)
        }
    }
}

impl std::fmt::Debug for DataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataService")
            .field("registry", &self.registry)
            .field("readiness", &self.readiness.state())
            .field("timezone", &self.timezone_name())
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timezone_name() {
        let (service, _) = testing::service();
        assert_eq!(service.timezone_name(), "UTC");

        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(service.with_timezone(ist).timezone_name(), "+05:30");
    }
}
