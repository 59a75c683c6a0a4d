//! Benchmarks for binding and remote execution.
//!
//! Run with: `cargo bench --package bindery-runtime --bench bind_bench`
//!
//! # Performance Baselines
//!
//! - `bind` with a chain of cross-module helpers (rehome + capture + encode)
//! - `serBody` decode at each compression level
//! - one full execution of a bound function

use std::hint::black_box;

use bindery_runtime::reactive::codec::{decode_body, encode_body};
use bindery_runtime::{App, Arg, BindOptions, EngineConfig};
use bindery_widgets::{NumberInput, Text};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

/// Modules `m0 .. m{depth}` where each function calls the next one.
fn chained_app(depth: usize, level: u32) -> (App, bindery_core::NodeId, bindery_core::NodeId) {
    let config = EngineConfig {
        compression_level: level,
        ..EngineConfig::default()
    };
    let mut app = App::new("bench").with_config(config);
    app.load_module(&format!("m{depth}"), &format!("fn f{depth}(x: int) -> int = x + 1"))
        .unwrap();
    for i in (0..depth).rev() {
        let next = i + 1;
        app.load_module(
            &format!("m{i}"),
            &format!("use m{next}::f{next};\nfn f{i}(x: int) -> int = f{next}(x) * 2"),
        )
        .unwrap();
    }
    let input = app.add_node(NumberInput::new().value(3));
    let out = app.add_node(Text::empty());
    (app, input, out)
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind/helper_chain");
    for depth in [1usize, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter_batched(
                || chained_app(depth, 6),
                |(mut app, input, out)| {
                    black_box(
                        app.bind(&out, "m0::f0", vec![Arg::from(&input)], BindOptions::new())
                            .unwrap(),
                    )
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/decode_body");
    for level in [0u32, 6, 9] {
        let (mut app, input, out) = chained_app(16, level);
        let report = app
            .bind(&out, "m0::f0", vec![Arg::from(&input)], BindOptions::new())
            .unwrap();
        let encoded = app.functions().get(&report.body_id).unwrap().ser_body.clone();
        let body = decode_body(&encoded).unwrap();
        group.bench_with_input(BenchmarkId::new("level", level), &encoded, |b, encoded| {
            b.iter(|| black_box(decode_body(encoded).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("encode", level), &body, |b, body| {
            b.iter(|| black_box(encode_body(body, level).unwrap()));
        });
    }
    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let (mut app, input, out) = chained_app(8, 6);
    let report = app
        .bind(&out, "m0::f0", vec![Arg::from(&input)], BindOptions::new())
        .unwrap();
    c.bench_function("execute/helper_chain_8", |b| {
        b.iter(|| black_box(app.execute(&report.body_id).unwrap()));
    });
}

criterion_group!(benches, bench_bind, bench_decode, bench_execute);
criterion_main!(benches);
