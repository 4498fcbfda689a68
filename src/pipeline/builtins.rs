//! Built-in aggregates
//!
//! - **Summaries** (`Avg`, `Sum`, `Min`, `Max`, `Count`, `First`, `Last`):
//!   collapse the input to one row stamped with its first Epoch. Parameters
//!   name the columns to summarize; none means every non-Epoch column.
//! - **EMA**(`'<period>'`, col): appends an `EMA` column, seeded with the
//!   first value and smoothed with `α = 2 / (period + 1)`.
//! - **Resample**(`'<timeframe>'`, Open, High, Low, Close[, Volume]):
//!   down-samples OHLC(V) bars into timeframe-aligned buckets.

use crate::bucket::Timeframe;
use crate::pipeline::aggregate::Aggregate;
use crate::pipeline::args::ArgumentMap;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::AggregateRegistry;
use crate::query::AggregationFunc;
use crate::storage::{Column, ColumnSeries, EPOCH};

const SUMMARIES: [AggregationFunc; 7] = [
    AggregationFunc::Avg,
    AggregationFunc::Sum,
    AggregationFunc::Min,
    AggregationFunc::Max,
    AggregationFunc::Count,
    AggregationFunc::First,
    AggregationFunc::Last,
];

/// Register every built-in aggregate
pub fn register_all(registry: &mut AggregateRegistry) {
    for func in SUMMARIES {
        registry.register(&func.to_string(), move || {
            (
                Box::new(Summary::new(func)) as Box<dyn Aggregate>,
                ArgumentMap::new(&[]).with_variadic("Columns"),
            )
        });
    }
    registry.register("EMA", || {
        (
            Box::new(Ema::default()) as Box<dyn Aggregate>,
            ArgumentMap::new(&["Value"]),
        )
    });
    registry.register("Resample", || {
        (
            Box::new(Resample::default()) as Box<dyn Aggregate>,
            ArgumentMap::new(&["Open", "High", "Low", "Close"]).with_optional(&["Volume"]),
        )
    });
}

fn input_column<'a>(input: &'a ColumnSeries, name: &str) -> PipelineResult<&'a Column> {
    input
        .get(name)
        .ok_or_else(|| PipelineError::Execution(format!("input has no column {}", name)))
}

fn input_epochs(input: &ColumnSeries) -> PipelineResult<&[i64]> {
    input
        .epoch()
        .ok_or_else(|| PipelineError::Execution("input has no Epoch column".to_string()))
}

/// One-row summary over selected columns
pub struct Summary {
    func: AggregationFunc,
    columns: Vec<String>,
    input: Option<ColumnSeries>,
}

impl Summary {
    pub fn new(func: AggregationFunc) -> Self {
        Self {
            func,
            columns: Vec::new(),
            input: None,
        }
    }
}

impl Aggregate for Summary {
    fn init_arg_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn init(&mut self, args: &ArgumentMap, _literals: &[String]) -> PipelineResult<()> {
        self.columns = args.variadic().to_vec();
        Ok(())
    }

    fn accum(&mut self, input: &ColumnSeries) -> PipelineResult<()> {
        input_epochs(input)?;
        for name in &self.columns {
            input_column(input, name)?;
        }
        match self.input.as_mut() {
            Some(acc) => acc.append(input)?,
            None => self.input = Some(input.clone()),
        }
        Ok(())
    }

    /// One row stamped with the first Epoch, or zero rows with the same
    /// columns when the input is empty
    fn output(&mut self) -> Option<ColumnSeries> {
        let input = self.input.take()?;
        let epochs = input.epoch()?;
        let first = epochs.first().copied();

        let names: Vec<String> = if self.columns.is_empty() {
            input
                .column_names()
                .iter()
                .filter(|n| n.as_str() != EPOCH)
                .cloned()
                .collect()
        } else {
            self.columns.clone()
        };

        let mut out = ColumnSeries::with_epoch(first.into_iter().collect());
        if names.is_empty() && self.func == AggregationFunc::Count {
            let count = first.map(|_| epochs.len() as i64).into_iter().collect();
            out.add_column("Count", Column::Int64(count)).ok()?;
            return Some(out);
        }
        for name in names {
            let values = input.get(&name)?.to_f64();
            let column = match (self.func, first) {
                (AggregationFunc::Count, Some(_)) => Column::Int64(vec![values.len() as i64]),
                (AggregationFunc::Count, None) => Column::Int64(Vec::new()),
                (_, None) => Column::Float64(Vec::new()),
                (func, Some(_)) => Column::Float64(vec![func.apply(&values)?]),
            };
            out.add_column(name, column).ok()?;
        }
        Some(out)
    }
}

/// Exponential moving average of one column
#[derive(Default)]
pub struct Ema {
    alpha: f64,
    value_column: String,
    result: Option<ColumnSeries>,
}

impl Aggregate for Ema {
    fn init_arg_names(&self) -> Vec<String> {
        vec!["Period".to_string()]
    }

    fn init(&mut self, args: &ArgumentMap, literals: &[String]) -> PipelineResult<()> {
        let raw = literals.first().map(String::as_str).unwrap_or("");
        let period: usize = raw
            .trim()
            .parse()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| PipelineError::Execution(format!("invalid EMA period {:?}", raw)))?;
        self.alpha = 2.0 / (period as f64 + 1.0);
        self.value_column = args
            .get("Value")
            .ok_or_else(|| PipelineError::Execution("EMA needs a value column".to_string()))?
            .to_string();
        Ok(())
    }

    fn accum(&mut self, input: &ColumnSeries) -> PipelineResult<()> {
        let values = input_column(input, &self.value_column)?.to_f64();
        let mut ema = Vec::with_capacity(values.len());
        let mut prev: Option<f64> = None;
        for v in values {
            let next = match prev {
                Some(p) => self.alpha * v + (1.0 - self.alpha) * p,
                None => v,
            };
            ema.push(next);
            prev = Some(next);
        }

        let mut out = input.clone();
        out.add_column("EMA", Column::Float64(ema))?;
        self.result = Some(out);
        Ok(())
    }

    fn output(&mut self) -> Option<ColumnSeries> {
        self.result.take()
    }
}

/// OHLC(V) down-sampling into coarser timeframe buckets
#[derive(Default)]
pub struct Resample {
    timeframe: Option<Timeframe>,
    roles: Vec<(&'static str, String)>,
    result: Option<ColumnSeries>,
}

struct Bar {
    start: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl Aggregate for Resample {
    fn init_arg_names(&self) -> Vec<String> {
        vec!["Timeframe".to_string()]
    }

    fn init(&mut self, args: &ArgumentMap, literals: &[String]) -> PipelineResult<()> {
        let raw = literals.first().map(String::as_str).unwrap_or("");
        let tf = Timeframe::parse(raw).map_err(|e| PipelineError::Execution(e.to_string()))?;
        self.timeframe = Some(tf);
        self.roles = ["Open", "High", "Low", "Close", "Volume"]
            .into_iter()
            .filter_map(|role| args.get(role).map(|col| (role, col.to_string())))
            .collect();
        Ok(())
    }

    fn accum(&mut self, input: &ColumnSeries) -> PipelineResult<()> {
        let tf = self
            .timeframe
            .ok_or_else(|| PipelineError::Execution("Resample is not initialized".to_string()))?;
        let epochs = input_epochs(input)?;
        let mut columns = Vec::with_capacity(self.roles.len());
        for (_, name) in &self.roles {
            columns.push(input_column(input, name)?.to_f64());
        }
        let has_volume = columns.len() == 5;
        let at = |col: usize, row: usize| columns[col][row];

        let mut bars: Vec<Bar> = Vec::new();
        for (row, &epoch) in epochs.iter().enumerate() {
            let start = tf.truncate(epoch);
            let volume = if has_volume { at(4, row) } else { 0.0 };
            match bars.last_mut() {
                Some(bar) if bar.start == start => {
                    bar.high = bar.high.max(at(1, row));
                    bar.low = bar.low.min(at(2, row));
                    bar.close = at(3, row);
                    bar.volume += volume;
                }
                _ => bars.push(Bar {
                    start,
                    open: at(0, row),
                    high: at(1, row),
                    low: at(2, row),
                    close: at(3, row),
                    volume,
                }),
            }
        }

        let mut out = ColumnSeries::with_epoch(bars.iter().map(|b| b.start).collect());
        out.add_column("Open", Column::Float64(bars.iter().map(|b| b.open).collect()))?;
        out.add_column("High", Column::Float64(bars.iter().map(|b| b.high).collect()))?;
        out.add_column("Low", Column::Float64(bars.iter().map(|b| b.low).collect()))?;
        out.add_column("Close", Column::Float64(bars.iter().map(|b| b.close).collect()))?;
        if has_volume {
            out.add_column("Volume", Column::Float64(bars.iter().map(|b| b.volume).collect()))?;
        }
        self.result = Some(out);
        Ok(())
    }

    fn output(&mut self) -> Option<ColumnSeries> {
        self.result.take()
    }
}
