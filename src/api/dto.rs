//! Data Transfer Objects
//!
//! Wire forms of the RPC requests and replies. Field names follow the
//! established client contract (`isSQLStatement`, `timeStart`, ...).

use crate::service::QueryRequest;
use serde::{Deserialize, Serialize};

pub use crate::service::{ListSymbolsReply, RangeLimitArgs, RangeLimitReply, ResultEnvelope};

/// Batch reply of `/rpc/query`
pub type MultiQueryResponse = ResultEnvelope;

// ============================================
// QUERY DTOs
// ============================================

/// One query as sent by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequestDto {
    /// Selects the SQL path; the structured fields are then ignored
    #[serde(default, rename = "isSQLStatement")]
    pub is_sql_statement: bool,
    #[serde(default)]
    pub sql_statement: String,

    #[serde(default)]
    pub destination: String,
    /// Unix seconds, 0 for an open start
    #[serde(default)]
    pub time_start: i64,
    /// Unix seconds, 0 for an open end
    #[serde(default)]
    pub time_end: i64,
    #[serde(default)]
    pub limit_record_count: usize,
    #[serde(default)]
    pub time_order_ascending: bool,
    /// Aggregate calls applied in order, e.g. `Resample('1H', Open, High, Low, Close)`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<String>,
}

impl QueryRequestDto {
    pub fn sql(statement: impl Into<String>) -> Self {
        Self {
            is_sql_statement: true,
            sql_statement: statement.into(),
            ..Default::default()
        }
    }

    pub fn destination(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Default::default()
        }
    }
}

impl From<QueryRequestDto> for QueryRequest {
    fn from(dto: QueryRequestDto) -> Self {
        if dto.is_sql_statement {
            QueryRequest::Sql {
                statement: dto.sql_statement,
            }
        } else {
            QueryRequest::Structured {
                destination: dto.destination,
                time_start: dto.time_start,
                time_end: dto.time_end,
                limit_record_count: dto.limit_record_count,
                time_order_ascending: dto.time_order_ascending,
                functions: dto.functions,
            }
        }
    }
}

/// Body of `/rpc/query`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiQueryRequest {
    #[serde(default)]
    pub requests: Vec<QueryRequestDto>,
}

impl MultiQueryRequest {
    /// Resolve every request into its service form
    pub fn into_requests(self) -> Vec<QueryRequest> {
        self.requests.into_iter().map(QueryRequest::from).collect()
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy or starting
    pub status: String,
    /// Query readiness gate: ready or not_ready
    pub query_state: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
    /// Timezone request ranges are interpreted in
    pub timezone: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let dto: QueryRequestDto = serde_json::from_str(
            r#"{"destination": "AAPL/1Min/OHLCV", "timeStart": 60, "limitRecordCount": 5,
                "timeOrderAscending": true, "functions": ["Max(Close)"]}"#,
        )
        .unwrap();

        assert_eq!(
            QueryRequest::from(dto),
            QueryRequest::Structured {
                destination: "AAPL/1Min/OHLCV".to_string(),
                time_start: 60,
                time_end: 0,
                limit_record_count: 5,
                time_order_ascending: true,
                functions: vec!["Max(Close)".to_string()],
            }
        );
    }

    #[test]
    fn test_sql_flag_selects_sql_path() {
        let dto: QueryRequestDto = serde_json::from_str(
            r#"{"isSQLStatement": true, "sqlStatement": "SELECT * FROM 'AAPL/1Min/OHLCV'",
                "destination": "ignored"}"#,
        )
        .unwrap();

        assert_eq!(
            QueryRequest::from(dto),
            QueryRequest::sql("SELECT * FROM 'AAPL/1Min/OHLCV'")
        );
    }

    #[test]
    fn test_serialize_roundtrips_through_wire_names() {
        let json = serde_json::to_value(QueryRequestDto::sql("SELECT 1")).unwrap();
        assert_eq!(json["isSQLStatement"], true);
        assert_eq!(json["sqlStatement"], "SELECT 1");
    }
}
