//! Composite bucket key
//!
//! A key is written `items:categories`, both halves `/`-delimited and paired
//! by position:
//!
//! ```text
//! AAPL,TSLA/1Min/OHLCV:Symbol/Timeframe/AttributeGroup
//! ```
//!
//! The `:categories` half is optional and defaults to
//! `Symbol/Timeframe/AttributeGroup`. A key always serializes to the full
//! `items:categories` form, which parses back to an equal key.

use crate::bucket::error::{KeyError, KeyResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Category holding one or more comma-separated symbols
pub const SYMBOL: &str = "Symbol";
/// Category holding the sampling granularity
pub const TIMEFRAME: &str = "Timeframe";
/// Category holding the record format (column schema name)
pub const ATTRIBUTE_GROUP: &str = "AttributeGroup";

/// Category layout used when a key omits its `:categories` half
pub const DEFAULT_CATEGORIES: &str = "Symbol/Timeframe/AttributeGroup";

/// Composite identifier of a stored time-series bucket
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    items: String,
    categories: String,
}

impl BucketKey {
    /// Parse a key string, applying the default category layout when absent
    ///
    /// A single category holds one opaque item, so synthetic keys parse back.
    pub fn parse(key: &str) -> KeyResult<Self> {
        let key = key.trim();
        let (items, categories) = match key.rsplit_once(':') {
            Some((items, categories)) => (items, categories),
            None => (key, DEFAULT_CATEGORIES),
        };

        if items.is_empty() {
            return Err(KeyError::Parse {
                key: key.to_string(),
                reason: "no items".to_string(),
            });
        }

        let item_count = items.split('/').count();
        let category_count = categories.split('/').count();
        if category_count > 1 && item_count != category_count {
            return Err(KeyError::Parse {
                key: key.to_string(),
                reason: format!(
                    "{} items do not match {} categories",
                    item_count, category_count
                ),
            });
        }

        Ok(Self {
            items: items.to_string(),
            categories: categories.to_string(),
        })
    }

    /// Key with a single opaque item under one category
    ///
    /// Used to label results that do not come from a stored bucket, such as
    /// the output of a SQL statement. The item is not split on `/`.
    pub fn synthetic(item: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            items: item.into(),
            categories: category.into(),
        }
    }

    /// The raw items half
    pub fn items(&self) -> &str {
        &self.items
    }

    /// The raw categories half
    pub fn categories(&self) -> &str {
        &self.categories
    }

    fn position(&self, category: &str) -> Option<usize> {
        self.categories.split('/').position(|c| c == category)
    }

    /// The item stored under `category`, empty if the category is absent
    pub fn item_in_category(&self, category: &str) -> &str {
        match self.position(category) {
            Some(0) if !self.categories.contains('/') => &self.items,
            Some(idx) => self.items.split('/').nth(idx).unwrap_or(""),
            None => "",
        }
    }

    /// Comma-separated values under `category`, empty entries dropped
    pub fn multi_item_in_category(&self, category: &str) -> Vec<String> {
        self.item_in_category(category)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Overwrite the item under `category`
    pub fn set_item_in_category(&mut self, category: &str, item: &str) -> KeyResult<()> {
        let idx = self.position(category).ok_or_else(|| KeyError::Parse {
            key: self.to_string(),
            reason: format!("no {} category", category),
        })?;
        if !self.categories.contains('/') {
            self.items = item.to_string();
            return Ok(());
        }
        let items: Vec<&str> = self
            .items
            .split('/')
            .enumerate()
            .map(|(i, v)| if i == idx { item } else { v })
            .collect();
        self.items = items.join("/");
        Ok(())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.multi_item_in_category(SYMBOL)
    }

    pub fn timeframe(&self) -> &str {
        self.item_in_category(TIMEFRAME)
    }

    pub fn record_format(&self) -> &str {
        self.item_in_category(ATTRIBUTE_GROUP)
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.items, self.categories)
    }
}

impl FromStr for BucketKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BucketKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
