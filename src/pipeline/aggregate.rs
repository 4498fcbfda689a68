//! Aggregate contracts
//!
//! Every call in a chain gets a fresh instance from its factory:
//!
//! ```text
//! factory.create() → (instance, ArgumentMap)
//!   ArgumentMap::prepare(params)
//!   instance.init(&args, literals)
//!   instance.accum(input)
//!   instance.output() → ColumnSeries
//! ```

use crate::pipeline::args::ArgumentMap;
use crate::pipeline::error::PipelineResult;
use crate::storage::ColumnSeries;

/// One running aggregate
pub trait Aggregate: Send {
    /// Names of the quoted init values this aggregate requires, in order
    fn init_arg_names(&self) -> Vec<String>;

    /// Configure from the bound argument map and the call's literals
    fn init(&mut self, args: &ArgumentMap, literals: &[String]) -> PipelineResult<()>;

    /// Consume one input series
    fn accum(&mut self, input: &ColumnSeries) -> PipelineResult<()>;

    /// The result, or `None` if nothing was produced
    fn output(&mut self) -> Option<ColumnSeries>;
}

/// Creates fresh aggregate instances
pub trait AggregateFactory: Send + Sync {
    fn create(&self) -> (Box<dyn Aggregate>, ArgumentMap);
}

impl<F> AggregateFactory for F
where
    F: Fn() -> (Box<dyn Aggregate>, ArgumentMap) + Send + Sync,
{
    fn create(&self) -> (Box<dyn Aggregate>, ArgumentMap) {
        self()
    }
}
