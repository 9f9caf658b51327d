//! Performance benchmarks for path search and conversion.
//!
//! Run with: `cargo bench --bench search`
//!
//! ## Workloads
//!
//! | Benchmark | Graph | Notes |
//! |-----------|-------|-------|
//! | chain | n types in a line | Search depth grows with n |
//! | grid | n x n lattice | Many equal-cost routes |
//! | builtin_fallback | builtins | First route fails, second succeeds |
//! | contended_convert | builtins | Read lock shared across threads |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use conversion_graph::{
    BoxError, Conversion, Conversions, ConvertRequest, EdgeTable,
    PathSearch, SearchPolicy, SearchRequest, TypeKey, Value, VariationKey,
};

fn pass_through() -> Arc<dyn Conversion> {
    Arc::new(|v: &Value| -> Result<Value, BoxError> {
        Ok(Value::new(v.downcast_ref::<u64>().copied().unwrap_or(0) + 1))
    })
}

fn key(name: String) -> VariationKey {
    VariationKey::bare(TypeKey::named(name))
}

/// Types T0 -> T1 -> ... -> Tn.
fn build_chain(n: usize) -> EdgeTable {
    let mut table = EdgeTable::new();
    for i in 0..n {
        table
            .register(1, key(format!("T{}", i)), key(format!("T{}", i + 1)), pass_through())
            .unwrap();
    }
    table
}

/// Lattice where each cell links right and down.
fn build_grid(n: usize) -> EdgeTable {
    let mut table = EdgeTable::new();
    for row in 0..n {
        for col in 0..n {
            let here = key(format!("G{}_{}", row, col));
            if col + 1 < n {
                table
                    .register(1, here.clone(), key(format!("G{}_{}", row, col + 1)), pass_through())
                    .unwrap();
            }
            if row + 1 < n {
                table
                    .register(1, here, key(format!("G{}_{}", row + 1, col)), pass_through())
                    .unwrap();
            }
        }
    }
    table
}

fn bench_chain_search(c: &mut Criterion) {
    let policy = SearchPolicy::default();
    let mut group = c.benchmark_group("chain");

    for n in [10, 100, 1000] {
        let table = build_chain(n);
        let request = SearchRequest::new(
            vec![key("T0".to_string())],
            TypeKey::named(format!("T{}", n)),
            None,
            false,
        );

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("types", n), &request, |b, request| {
            let search = PathSearch::new(&table, &policy);
            let excluded = BTreeSet::new();
            b.iter(|| {
                let path = search.find_path(black_box(request), &excluded).unwrap();
                assert_eq!(path.as_ref().map(|p| p.len()), Some(n));
                path
            })
        });
    }

    group.finish();
}

fn bench_grid_search(c: &mut Criterion) {
    let policy = SearchPolicy::default();
    let mut group = c.benchmark_group("grid");

    for n in [5, 20, 50] {
        let table = build_grid(n);
        let request = SearchRequest::new(
            vec![key("G0_0".to_string())],
            TypeKey::named(format!("G{}_{}", n - 1, n - 1)),
            None,
            false,
        );

        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_with_input(BenchmarkId::new("side", n), &request, |b, request| {
            let search = PathSearch::new(&table, &policy);
            let excluded = BTreeSet::new();
            b.iter(|| search.find_path(black_box(request), &excluded).unwrap())
        });
    }

    group.finish();
}

fn builtins() -> Conversions {
    let conv = Conversions::new();
    conversion_graph::register_builtins(&conv).unwrap();
    conv
}

/// `"abc"` fails the direct parse and succeeds through `bool`.
fn bench_builtin_fallback(c: &mut Criterion) {
    let conv = builtins();
    let request = ConvertRequest::to::<i64>();

    c.bench_function("builtin_fallback", |b| {
        b.iter(|| {
            conv.convert(Value::new(String::from("abc")), black_box(&request))
                .unwrap()
        })
    });
}

fn bench_contended_convert(c: &mut Criterion) {
    let conv = Arc::new(builtins());
    let mut group = c.benchmark_group("contended_convert");

    for threads in [1, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * 100));
        group.bench_with_input(BenchmarkId::new("threads", threads), &threads, |b, &threads| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let conv = Arc::clone(&conv);
                        thread::spawn(move || {
                            for i in 0..100i64 {
                                let s: String = conv.convert_to(Value::new(i * t)).unwrap();
                                black_box(s);
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_chain_search,
    bench_grid_search,
    bench_builtin_fallback,
    bench_contended_convert,
);

criterion_main!(benches);
