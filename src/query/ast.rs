//! SQL Abstract Syntax Tree
//!
//! Defines the AST for the SQL dialect accepted in place of a structured
//! request. A statement reads exactly one bucket.
//!
//! # Example Statements
//!
//! ```text
//! SELECT * FROM 'AAPL/1Min/OHLCV'
//! SELECT Close FROM 'AAPL/1Min/OHLCV' WHERE Epoch >= 1700000000 LIMIT 10
//! SELECT MAX(High) AS hi, MIN(Low) AS lo FROM 'AAPL/1D/OHLCV'
//! ```

use serde::{Deserialize, Serialize};

/// Wildcard column selector
pub const WILDCARD: &str = "*";

/// A parsed statement ready for validation
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Columns to select
    pub select: Vec<SelectItem>,
    /// Bucket key the statement reads
    pub from: String,
    /// WHERE conditions, all of which must hold
    pub filters: Vec<Filter>,
    /// Optional cap on returned rows
    pub limit: Option<usize>,
}

impl Query {
    /// Whether any select item is aggregated
    pub fn is_aggregate(&self) -> bool {
        self.select.iter().any(|s| s.aggregation.is_some())
    }
}

/// An item in the SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    /// Column name, or `*`
    pub column: String,
    /// Optional aggregation function
    pub aggregation: Option<AggregationFunc>,
    /// Optional alias for the result column
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            aggregation: None,
            alias: None,
        }
    }

    pub fn with_aggregation(mut self, agg: AggregationFunc) -> Self {
        self.aggregation = Some(agg);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.column == WILDCARD
    }

    /// Name of the result column: the alias, `FUNC(column)`, or the column
    pub fn output_name(&self) -> String {
        match (&self.alias, self.aggregation) {
            (Some(alias), _) => alias.clone(),
            (None, Some(agg)) => format!("{}({})", agg, self.column),
            (None, None) => self.column.clone(),
        }
    }
}

/// Aggregation functions available in statements and as chain stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFunc {
    /// Average of values
    Avg,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Count of values
    Count,
    /// Last value in the range
    Last,
    /// First value in the range
    First,
}

impl AggregationFunc {
    /// Apply aggregation to a slice of values
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        Some(match self {
            Self::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Self::Count => values.len() as f64,
            Self::Last => *values.last()?,
            Self::First => *values.first()?,
        })
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "avg" | "average" => Some(Self::Avg),
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "count" => Some(Self::Count),
            "last" => Some(Self::Last),
            "first" => Some(Self::First),
            _ => None,
        }
    }
}

impl std::fmt::Display for AggregationFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Avg => write!(f, "AVG"),
            Self::Sum => write!(f, "SUM"),
            Self::Min => write!(f, "MIN"),
            Self::Max => write!(f, "MAX"),
            Self::Count => write!(f, "COUNT"),
            Self::Last => write!(f, "LAST"),
            Self::First => write!(f, "FIRST"),
        }
    }
}

/// A condition in the WHERE clause
///
/// Conditions on `Epoch` narrow the read range; all others filter rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: Operator,
    pub value: f64,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: Operator, value: f64) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal to
    Eq,
    /// Not equal to
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal to
    Gte,
    /// Less than
    Lt,
    /// Less than or equal to
    Lte,
}

impl Operator {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "=" | "==" => Some(Self::Eq),
            "!=" | "<>" => Some(Self::Ne),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            _ => None,
        }
    }

    /// Compare two f64 values
    pub fn compare_f64(&self, a: f64, b: f64) -> bool {
        match self {
            Self::Eq => (a - b).abs() < f64::EPSILON,
            Self::Ne => (a - b).abs() >= f64::EPSILON,
            Self::Gt => a > b,
            Self::Gte => a >= b,
            Self::Lt => a < b,
            Self::Lte => a <= b,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_aggregate() {
        let mut query = Query {
            select: vec![SelectItem::new("High"), SelectItem::new("Low")],
            from: "AAPL/1D/OHLCV".to_string(),
            filters: vec![Filter::new("Close", Operator::Gt, 1.0)],
            limit: Some(5),
        };
        assert!(!query.is_aggregate());

        query.select[1] = SelectItem::new("Low").with_aggregation(AggregationFunc::Max);
        assert!(query.is_aggregate());
        assert_eq!(query.select[1].output_name(), "MAX(Low)");
    }

    #[test]
    fn test_output_name() {
        assert_eq!(SelectItem::new("Close").output_name(), "Close");
        let item = SelectItem::new("Close")
            .with_aggregation(AggregationFunc::Avg)
            .with_alias("avg_close");
        assert_eq!(item.output_name(), "avg_close");
    }

    #[test]
    fn test_aggregation_functions() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        assert_eq!(AggregationFunc::Avg.apply(&values), Some(3.0));
        assert_eq!(AggregationFunc::Sum.apply(&values), Some(15.0));
        assert_eq!(AggregationFunc::Min.apply(&values), Some(1.0));
        assert_eq!(AggregationFunc::Max.apply(&values), Some(5.0));
        assert_eq!(AggregationFunc::Count.apply(&values), Some(5.0));
        assert_eq!(AggregationFunc::First.apply(&values), Some(1.0));
        assert_eq!(AggregationFunc::Last.apply(&values), Some(5.0));

        let empty: Vec<f64> = vec![];
        assert_eq!(AggregationFunc::Avg.apply(&empty), None);
    }

    #[test]
    fn test_aggregation_from_str() {
        assert_eq!(AggregationFunc::from_str("Average"), Some(AggregationFunc::Avg));
        assert_eq!(AggregationFunc::from_str("median"), None);
    }

    #[test]
    fn test_operator_compare() {
        assert!(Operator::Eq.compare_f64(5.0, 5.0));
        assert!(!Operator::Eq.compare_f64(5.0, 6.0));
        assert!(Operator::Gt.compare_f64(6.0, 5.0));
        assert!(!Operator::Gt.compare_f64(5.0, 5.0));
        assert!(Operator::Gte.compare_f64(5.0, 5.0));
        assert!(Operator::Lt.compare_f64(4.0, 5.0));
        assert!(Operator::Lte.compare_f64(5.0, 5.0));
        assert!(Operator::Ne.compare_f64(4.0, 5.0));
        assert_eq!(Operator::from_str("<>"), Some(Operator::Ne));
    }
}
