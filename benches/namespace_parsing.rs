//! Benchmarks for the namespace stream parser and reference rewriter
//!
//! Generated declaration files run to hundreds of thousands of lines, so the
//! parser's per-line cost dominates the types pass.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sdksplit::splitter::{parse_str, Direction, ParserOptions, RuleSet, Scope};

/// Synthetic declaration stream: `modules` modules, each with `versions`
/// version blocks of `interfaces` interfaces.
fn synthetic_stream(modules: usize, versions: usize, interfaces: usize) -> String {
    let mut out = String::from("import * as inputs from \"../types/input\";\n");
    for m in 0..modules {
        out.push_str(&format!("export namespace mod{} {{\n", m));
        for i in 0..interfaces {
            out.push_str(&format!(
                "    export interface Item{i}Args {{\n        next?: pulumi.Input<inputs.mod{m}.Item{i}Args>;\n    }}\n"
            ));
        }
        for v in 0..versions {
            out.push_str(&format!("    export namespace v2023{:04} {{\n", v));
            for i in 0..interfaces {
                out.push_str(&format!(
                    "        export interface Item{i}Args {{\n            next?: pulumi.Input<inputs.mod{m}.v2023{v:04}.Item{i}Args>;\n        }}\n"
                ));
            }
            out.push_str("    }\n");
        }
        out.push_str("}\n");
    }
    out
}

/// Benchmark 1: Whole-stream parsing at increasing module counts
fn bench_parse_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_stream");
    for modules in [10, 100] {
        let source = synthetic_stream(modules, 3, 20);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(modules), &source, |b, source| {
            b.iter(|| {
                black_box(parse_str(
                    black_box(source),
                    Direction::Inputs,
                    ParserOptions::default(),
                ))
            })
        });
    }
    group.finish();
}

/// Benchmark 2: Version splitting disabled (single slice per module)
fn bench_parse_inline_versions(c: &mut Criterion) {
    let source = synthetic_stream(50, 3, 20);
    let options = ParserOptions {
        split_versions: false,
        ..ParserOptions::default()
    };
    c.bench_function("parse_inline_versions", |b| {
        b.iter(|| black_box(parse_str(black_box(&source), Direction::Inputs, options.clone())))
    });
}

/// Benchmark 3: Rule application on single lines
fn bench_rewrite_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite_line");
    let rules = RuleSet::for_implementation(Scope::submodule("storage", "v20230101"));

    let hit = "    sku: pulumi.Input<inputs.storage.v20230101.SkuArgs | enums.storage.v20230101.Kind>;";
    group.bench_function("hit", |b| b.iter(|| black_box(rules.apply(black_box(hit)))));

    let miss = "    network?: pulumi.Input<inputs.network.SubResourceArgs>;";
    group.bench_function("miss", |b| b.iter(|| black_box(rules.apply(black_box(miss)))));

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_stream,
    bench_parse_inline_versions,
    bench_rewrite_line,
);

criterion_main!(benches);
