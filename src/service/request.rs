//! Request and reply types of the data service

use crate::service::assemble::MultiDataset;
use serde::{Deserialize, Serialize};

/// One query of a batch, resolved from its wire form
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRequest {
    /// A SQL statement reading one bucket
    Sql { statement: String },
    /// A destination key with range, limit and an optional aggregate chain
    Structured {
        destination: String,
        /// Inclusive Unix seconds; 0 leaves the start open
        time_start: i64,
        /// Inclusive Unix seconds; 0 leaves the end open
        time_end: i64,
        /// 0 means no limit
        limit_record_count: usize,
        time_order_ascending: bool,
        functions: Vec<String>,
    },
}

impl QueryRequest {
    pub fn sql(statement: impl Into<String>) -> Self {
        QueryRequest::Sql {
            statement: statement.into(),
        }
    }

    /// Unbounded structured request for `destination`
    pub fn structured(destination: impl Into<String>) -> Self {
        QueryRequest::Structured {
            destination: destination.into(),
            time_start: 0,
            time_end: 0,
            limit_record_count: 0,
            time_order_ascending: false,
            functions: Vec::new(),
        }
    }
}

/// One entry of a [`ResultEnvelope`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub result: MultiDataset,
}

/// Batch result: one response per request, in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub responses: Vec<QueryResponse>,
    pub version: String,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLimitArgs {
    pub destination: String,
}

/// First and last stored epochs of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLimitReply {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListSymbolsReply {
    pub results: Vec<String>,
}
