//! Benchmarks for the query path
//!
//! Run with: cargo bench

use chronicle_query::bucket::BucketKey;
use chronicle_query::pipeline::{parse_call, run_chain, AggregateRegistry};
use chronicle_query::query::parse_query;
use chronicle_query::service::{DataService, QueryRequest, ReadyState};
use chronicle_query::storage::{Column, ColumnSeries, MemoryStore};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;

fn create_bars(count: usize) -> ColumnSeries {
    let epochs: Vec<i64> = (0..count as i64).map(|i| (i + 1) * 60).collect();
    let close: Vec<f64> = (0..count).map(|i| 100.0 + (i % 17) as f64).collect();
    ColumnSeries::with_epoch(epochs)
        .column("Open", Column::Float64(close.clone()))
        .column("High", Column::Float64(close.iter().map(|v| v + 1.0).collect()))
        .column("Low", Column::Float64(close.iter().map(|v| v - 1.0).collect()))
        .column("Close", Column::Float64(close))
        .column("Volume", Column::Float64(vec![1000.0; count]))
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    group.bench_function("call", |b| {
        b.iter(|| parse_call(black_box("Resample('1H', Open, High, Low, Close, Volume)")).unwrap())
    });

    group.bench_function("sql", |b| {
        b.iter(|| {
            parse_query(black_box(
                "SELECT Epoch, Close FROM 'AAPL/1Min/OHLCV' WHERE Epoch >= 60 AND Close > 101 LIMIT 100",
            ))
            .unwrap()
        })
    });

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let registry = AggregateRegistry::with_builtins();
    let mut group = c.benchmark_group("chain");

    for size in [1_000, 10_000] {
        let bars = create_bars(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("resample_{}", size), |b| {
            b.iter(|| {
                run_chain(
                    &registry,
                    &["Resample('1H', Open, High, Low, Close, Volume)"],
                    black_box(bars.clone()),
                )
                .unwrap()
            })
        });

        group.bench_function(format!("ema_then_max_{}", size), |b| {
            b.iter(|| {
                run_chain(
                    &registry,
                    &["EMA('20', Close)", "Max(EMA)"],
                    black_box(bars.clone()),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let store = Arc::new(MemoryStore::default());
    for symbol in ["AAPL", "MSFT", "TSLA"] {
        let key = BucketKey::parse(&format!("{}/1Min/OHLCV", symbol)).unwrap();
        store.insert(&key, create_bars(10_000)).unwrap();
    }
    let service = DataService::new(
        store.clone(),
        store,
        Arc::new(AggregateRegistry::with_builtins()),
    );
    service.readiness().set(ReadyState::Ready);

    let mut group = c.benchmark_group("dispatch");

    let structured = vec![QueryRequest::Structured {
        destination: "AAPL,MSFT,TSLA/1Min/OHLCV".to_string(),
        time_start: 0,
        time_end: 0,
        limit_record_count: 500,
        time_order_ascending: false,
        functions: Vec::new(),
    }];
    group.bench_function("structured_multi_symbol", |b| {
        b.iter(|| service.query(black_box(Some(structured.as_slice()))).unwrap())
    });

    let sql = vec![QueryRequest::sql(
        "SELECT AVG(Close) FROM 'AAPL/1Min/OHLCV' WHERE Epoch >= 6000",
    )];
    group.bench_function("sql_aggregate", |b| {
        b.iter(|| service.query(black_box(Some(sql.as_slice()))).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_chain, bench_dispatch);
criterion_main!(benches);
