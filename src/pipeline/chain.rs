//! Call chain execution
//!
//! Runs each call against the previous stage's output; the first stage reads
//! the bucket's series.

use crate::pipeline::call::parse_call;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::registry::AggregateRegistry;
use crate::storage::ColumnSeries;

/// Run `calls` in order over `input`
///
/// An empty chain returns the input unchanged.
pub fn run_chain<S: AsRef<str>>(
    registry: &AggregateRegistry,
    calls: &[S],
    input: ColumnSeries,
) -> PipelineResult<ColumnSeries> {
    let mut current = input;

    for text in calls {
        let call = parse_call(text.as_ref())?;
        let factory = registry
            .get(&call.name)
            .ok_or_else(|| PipelineError::UnknownFunction(call.name.clone()))?;
        let (mut aggregate, mut args) = factory.create();

        args.prepare(&call.params)
            .map_err(|reason| PipelineError::ArgumentMapping {
                function: call.name.clone(),
                reason,
            })?;

        let required = aggregate.init_arg_names().len();
        if required > call.literals.len() {
            return Err(PipelineError::InitArguments {
                function: call.name.clone(),
                required,
                available: call.literals.len(),
            });
        }

        aggregate.init(&args, &call.literals)?;
        aggregate.accum(&current)?;
        let output = aggregate
            .output()
            .ok_or_else(|| PipelineError::NoResult(call.name.clone()))?;

        tracing::debug!(call = %call, rows = output.len(), "Aggregate stage complete");
        current = output;
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::Aggregate;
    use crate::pipeline::args::ArgumentMap;
    use crate::storage::Column;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Passes its input through unchanged
    struct Identity {
        init_args: Vec<String>,
        seen: Option<ColumnSeries>,
    }

    impl Aggregate for Identity {
        fn init_arg_names(&self) -> Vec<String> {
            self.init_args.clone()
        }

        fn init(&mut self, _args: &ArgumentMap, _literals: &[String]) -> PipelineResult<()> {
            Ok(())
        }

        fn accum(&mut self, input: &ColumnSeries) -> PipelineResult<()> {
            self.seen = Some(input.clone());
            Ok(())
        }

        fn output(&mut self) -> Option<ColumnSeries> {
            self.seen.take()
        }
    }

    /// Never produces output
    struct Silent;

    impl Aggregate for Silent {
        fn init_arg_names(&self) -> Vec<String> {
            Vec::new()
        }

        fn init(&mut self, _args: &ArgumentMap, _literals: &[String]) -> PipelineResult<()> {
            Ok(())
        }

        fn accum(&mut self, _input: &ColumnSeries) -> PipelineResult<()> {
            Ok(())
        }

        fn output(&mut self) -> Option<ColumnSeries> {
            None
        }
    }

    fn sample() -> ColumnSeries {
        ColumnSeries::with_epoch(vec![60, 120]).column("Close", Column::Float64(vec![1.0, 2.0]))
    }

    fn registry(created: Arc<AtomicUsize>) -> AggregateRegistry {
        let mut registry = AggregateRegistry::new();
        registry.register("Identity", move || {
            created.fetch_add(1, Ordering::SeqCst);
            (
                Box::new(Identity {
                    init_args: Vec::new(),
                    seen: None,
                }) as Box<dyn Aggregate>,
                ArgumentMap::new(&[]).with_variadic("Columns"),
            )
        });
        registry.register("TwoInit", || {
            (
                Box::new(Identity {
                    init_args: vec!["A".to_string(), "B".to_string()],
                    seen: None,
                }) as Box<dyn Aggregate>,
                ArgumentMap::new(&[]),
            )
        });
        registry.register("Silent", || {
            (Box::new(Silent) as Box<dyn Aggregate>, ArgumentMap::new(&[]))
        });
        registry
    }

    #[test]
    fn test_two_stage_identity_chain() {
        let created = Arc::new(AtomicUsize::new(0));
        let registry = registry(created.clone());

        let out = run_chain(&registry, &["identity()", "IDENTITY(Close)"], sample()).unwrap();
        assert_eq!(out, sample());
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_chain_passes_input() {
        let registry = AggregateRegistry::new();
        let calls: [&str; 0] = [];
        assert_eq!(run_chain(&registry, &calls, sample()).unwrap(), sample());
    }

    #[test]
    fn test_not_enough_init_arguments() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let err = run_chain(&registry, &["TwoInit('x')"], sample()).unwrap_err();
        match err {
            PipelineError::InitArguments {
                function,
                required,
                available,
            } => {
                assert_eq!(function, "TwoInit");
                assert_eq!(required, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let err = run_chain(&registry, &["Median(Close)"], sample()).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownFunction(ref n) if n == "Median"));
    }

    #[test]
    fn test_argument_mapping_failure() {
        let registry = AggregateRegistry::with_builtins();
        let err = run_chain(&registry, &["Resample('1H', Open)"], sample()).unwrap_err();
        assert!(matches!(err, PipelineError::ArgumentMapping { .. }));
    }

    #[test]
    fn test_no_result() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let err = run_chain(&registry, &["Silent()"], sample()).unwrap_err();
        assert_eq!(err.to_string(), "No result from aggregate Silent");
    }

    #[test]
    fn test_later_stage_reads_previous_output() {
        let registry = AggregateRegistry::with_builtins();
        let out = run_chain(&registry, &["EMA('1', Close)", "Max(EMA)"], sample()).unwrap();
        assert_eq!(out.get("EMA"), Some(&Column::Float64(vec![2.0])));
    }

    #[test]
    fn test_accum_failure_stops_chain() {
        let created = Arc::new(AtomicUsize::new(0));
        let mut registry = AggregateRegistry::with_builtins();
        let counter = created.clone();
        registry.register("After", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            (
                Box::new(Identity {
                    init_args: Vec::new(),
                    seen: None,
                }) as Box<dyn Aggregate>,
                ArgumentMap::new(&[]),
            )
        });

        let err = run_chain(&registry, &["EMA('3', Nope)", "After()"], sample()).unwrap_err();
        assert!(matches!(err, PipelineError::Execution(ref m) if m == "input has no column Nope"));
        assert_eq!(created.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_error_stops_chain() {
        let registry = AggregateRegistry::with_builtins();
        let err = run_chain(&registry, &["Max(Close", "Avg(Close)"], sample()).unwrap_err();
        assert!(matches!(err, PipelineError::UnparsableCall(_)));
    }
}
