//! Query Routes
//!
//! RPC endpoints of the data service.
//!
//! - POST /rpc/query - Run a batch of queries
//! - POST /rpc/range_limit - First and last stored epochs of a bucket
//! - POST /rpc/list_symbols - Every stored symbol
//!
//! An empty body means the caller sent no arguments.

use axum::{body::Bytes, extract::State, Json};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::api::dto::{
    ListSymbolsReply, MultiQueryRequest, MultiQueryResponse, RangeLimitArgs, RangeLimitReply,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /rpc/query
pub async fn query(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<MultiQueryResponse>> {
    let requests = parse_args::<MultiQueryRequest>(&body)?.map(MultiQueryRequest::into_requests);
    let envelope = state.service.query(requests.as_deref())?;
    Ok(Json(envelope))
}

/// POST /rpc/range_limit
pub async fn range_limit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<RangeLimitReply>> {
    let args = parse_args::<RangeLimitArgs>(&body)?;
    let reply = state.service.range_limit(args.as_ref())?;
    Ok(Json(reply))
}

/// POST /rpc/list_symbols
///
/// Takes no arguments; any body is ignored.
pub async fn list_symbols(State(state): State<Arc<AppState>>) -> ApiResult<Json<ListSymbolsReply>> {
    Ok(Json(state.service.list_symbols()?))
}

/// Decode optional JSON arguments
fn parse_args<T: DeserializeOwned>(body: &[u8]) -> ApiResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_empty_is_none() {
        assert!(parse_args::<RangeLimitArgs>(b"").unwrap().is_none());
        assert!(parse_args::<RangeLimitArgs>(b" \n").unwrap().is_none());
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args::<RangeLimitArgs>(br#"{"destination": "AAPL/1Min/OHLCV"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(args.destination, "AAPL/1Min/OHLCV");

        assert!(matches!(
            parse_args::<RangeLimitArgs>(b"not json"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
