//! Timeframes and the table of materialized timeframes
//!
//! A timeframe is written `<multiplier><unit>`, e.g. `1Min`, `5Min`, `4H`,
//! `1D`. Accepted units are `Sec`/`S`, `Min`/`T`, `H`, `D` and `W`; output
//! always uses the long spelling.
//!
//! Storage only materializes a few timeframes. A requested timeframe is served
//! from the coarsest materialized one that divides it evenly, and a record
//! count at the requested timeframe is scaled up to the equivalent count at the
//! materialized one:
//!
//! ```text
//! requested 5Min, stored {1Min, 1H, 1D}  →  queryable 1Min
//! 10 records @ 5Min                       →  50 records @ 1Min
//! ```

use crate::bucket::error::{KeyError, KeyResult};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Monday 1970-01-05 00:00:00 UTC, the anchor for week boundaries
const WEEK_ANCHOR: i64 = 4 * 86_400;

fn timeframe_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)(Sec|S|Min|T|H|D|W)$").expect("timeframe regex is valid")
    })
}

/// Unit of a timeframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl TimeUnit {
    /// Length of one unit in seconds
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 7 * 86_400,
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Second => "Sec",
            Self::Minute => "Min",
            Self::Hour => "H",
            Self::Day => "D",
            Self::Week => "W",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "Sec" | "S" => Some(Self::Second),
            "Min" | "T" => Some(Self::Minute),
            "H" => Some(Self::Hour),
            "D" => Some(Self::Day),
            "W" => Some(Self::Week),
            _ => None,
        }
    }
}

/// Sampling granularity of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timeframe {
    multiplier: u32,
    unit: TimeUnit,
}

impl Timeframe {
    pub fn new(multiplier: u32, unit: TimeUnit) -> KeyResult<Self> {
        if multiplier == 0 {
            return Err(KeyError::Timeframe("multiplier must be positive".to_string()));
        }
        Ok(Self { multiplier, unit })
    }

    /// Parse a timeframe string like `5Min`
    pub fn parse(s: &str) -> KeyResult<Self> {
        let s = s.trim();
        let caps = timeframe_regex()
            .captures(s)
            .ok_or_else(|| KeyError::Timeframe(format!("unrecognized timeframe {:?}", s)))?;
        let multiplier: u32 = caps[1]
            .parse()
            .map_err(|_| KeyError::Timeframe(format!("multiplier out of range in {:?}", s)))?;
        let unit = TimeUnit::from_suffix(&caps[2])
            .ok_or_else(|| KeyError::Timeframe(format!("unknown unit in {:?}", s)))?;
        Self::new(multiplier, unit)
    }

    /// Duration in seconds
    pub fn seconds(&self) -> i64 {
        self.multiplier as i64 * self.unit.seconds()
    }

    /// Start of the interval containing `epoch`
    ///
    /// Week intervals start on Monday; all others are aligned to the epoch.
    pub fn truncate(&self, epoch: i64) -> i64 {
        let width = self.seconds();
        let anchor = if self.unit == TimeUnit::Week { WEEK_ANCHOR } else { 0 };
        (epoch - anchor).div_euclid(width) * width + anchor
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.multiplier, self.unit.suffix())
    }
}

impl FromStr for Timeframe {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The timeframes storage actually materializes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeTable {
    /// Sorted finest first
    stored: Vec<Timeframe>,
}

impl TimeframeTable {
    pub fn new(stored: impl IntoIterator<Item = Timeframe>) -> Self {
        let mut stored: Vec<Timeframe> = stored.into_iter().collect();
        stored.sort_by_key(Timeframe::seconds);
        stored.dedup_by_key(|tf| tf.seconds());
        Self { stored }
    }

    /// Build from timeframe strings such as `["1Min", "1H", "1D"]`
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> KeyResult<Self> {
        let stored = names
            .iter()
            .map(|s| Timeframe::parse(s.as_ref()))
            .collect::<KeyResult<Vec<_>>>()?;
        Ok(Self::new(stored))
    }

    /// Whether `tf` is materialized as-is
    pub fn contains(&self, tf: &Timeframe) -> bool {
        self.stored.iter().any(|s| s.seconds() == tf.seconds())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timeframe> {
        self.stored.iter()
    }

    /// Coarsest materialized timeframe that evenly divides `requested`
    pub fn queryable_timeframe(&self, requested: &Timeframe) -> KeyResult<Timeframe> {
        self.stored
            .iter()
            .rev()
            .find(|s| requested.seconds() % s.seconds() == 0)
            .copied()
            .ok_or_else(|| {
                KeyError::Timeframe(format!("no materialized timeframe divides {}", requested))
            })
    }

    /// Translate a record count at `requested` into a count at `queryable`
    pub fn queryable_nrecords(
        &self,
        requested: &Timeframe,
        queryable: &Timeframe,
        nrecords: usize,
    ) -> usize {
        let ratio = (requested.seconds() / queryable.seconds()).max(1) as usize;
        nrecords.saturating_mul(ratio)
    }
}

impl Default for TimeframeTable {
    fn default() -> Self {
        Self::new([
            Timeframe {
                multiplier: 1,
                unit: TimeUnit::Minute,
            },
            Timeframe {
                multiplier: 1,
                unit: TimeUnit::Hour,
            },
            Timeframe {
                multiplier: 1,
                unit: TimeUnit::Day,
            },
        ])
    }
}
