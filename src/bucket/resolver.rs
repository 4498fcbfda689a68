//! Destination resolution
//!
//! Turns a request's destination string into a validated [`BucketKey`] and
//! rewrites its timeframe to one storage can serve.

use crate::bucket::error::{KeyError, KeyResult};
use crate::bucket::key::{BucketKey, ATTRIBUTE_GROUP, SYMBOL, TIMEFRAME};
use crate::bucket::timeframe::{Timeframe, TimeframeTable};

/// Requested and queryable timeframe of a canonicalized key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalTimeframe {
    /// Timeframe the caller asked for
    pub requested: Timeframe,
    /// Timeframe the key now points at
    pub queryable: Timeframe,
}

/// Parse a destination string into a key
pub fn resolve(destination: &str) -> KeyResult<BucketKey> {
    BucketKey::parse(destination)
}

/// Check that a destination names a Symbol set, one Timeframe and one AttributeGroup
pub fn validate(key: &BucketKey) -> KeyResult<()> {
    let missing: Vec<&str> = [
        (SYMBOL, key.symbols().is_empty()),
        (TIMEFRAME, key.timeframe().trim().is_empty()),
        (ATTRIBUTE_GROUP, key.record_format().trim().is_empty()),
    ]
    .into_iter()
    .filter(|(_, empty)| *empty)
    .map(|(name, _)| name)
    .collect();

    if !missing.is_empty() {
        return Err(KeyError::Validation(format!(
            "destinations must have a Symbol, Timeframe and AttributeGroup, missing {}, have: {}",
            missing.join(", "),
            key
        )));
    }

    for category in [TIMEFRAME, ATTRIBUTE_GROUP] {
        if key.item_in_category(category).contains(',') {
            return Err(KeyError::Validation(format!(
                "destinations must have exactly one {}, have: {}",
                category, key
            )));
        }
    }

    Ok(())
}

/// Point the key at the queryable timeframe for its requested one
///
/// The key's Timeframe item is overwritten in place.
pub fn canonicalize_timeframe(
    key: &mut BucketKey,
    table: &TimeframeTable,
) -> KeyResult<CanonicalTimeframe> {
    let requested = Timeframe::parse(key.timeframe())?;
    let queryable = table.queryable_timeframe(&requested)?;
    key.set_item_in_category(TIMEFRAME, &queryable.to_string())?;
    Ok(CanonicalTimeframe {
        requested,
        queryable,
    })
}
