//! Query plans handed to the planner collaborator

use crate::bucket::BucketKey;
use chrono::{DateTime, FixedOffset};

/// Which end of the time range a row limit counts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Earliest records first
    First,
    /// Latest records
    Last,
}

/// Cap on the number of rows read per bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLimit {
    pub direction: Direction,
    pub count: usize,
}

/// What to read: target keys, an optional row limit and an optional range
#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    targets: Vec<BucketKey>,
    row_limit: Option<RowLimit>,
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target_key(&mut self, key: BucketKey) -> &mut Self {
        self.targets.push(key);
        self
    }

    pub fn set_row_limit(&mut self, direction: Direction, count: usize) -> &mut Self {
        self.row_limit = Some(RowLimit { direction, count });
        self
    }

    /// Restrict to `[start, end]`, both inclusive; `None` leaves that side open
    pub fn set_range(
        &mut self,
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> &mut Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn targets(&self) -> &[BucketKey] {
        &self.targets
    }

    pub fn row_limit(&self) -> Option<RowLimit> {
        self.row_limit
    }

    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end
    }
}

/// A plan after the planner matched it against stored buckets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// One single-symbol key per matched bucket, in key order
    pub keys: Vec<BucketKey>,
    pub row_limit: Option<RowLimit>,
    /// Inclusive epoch bounds in seconds
    pub start_epoch: Option<i64>,
    pub end_epoch: Option<i64>,
}

impl ParseResult {
    /// Whether `epoch` falls inside the plan's range
    pub fn in_range(&self, epoch: i64) -> bool {
        self.start_epoch.map_or(true, |s| epoch >= s) && self.end_epoch.map_or(true, |e| epoch <= e)
    }
}
