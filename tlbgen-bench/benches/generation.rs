//! Generation benchmarks.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tlbgen_bench::{open_library, synthetic_manifest};
use tlbgen_codegen::{Dialect, Generator, scalar_name};
use tlbgen_model::{MemoryReader, ScalarTag};

fn benchmark_scalar_names(c: &mut Criterion) {
    c.bench_function("scalar_name_all_tags", |b| {
        b.iter(|| {
            for tag in ScalarTag::ALL {
                black_box(scalar_name(black_box(tag.raw()), Dialect::Winapi02));
            }
        })
    });
}

fn benchmark_manifest_parse(c: &mut Criterion) {
    let xml = synthetic_manifest(50, 10);

    c.bench_function("manifest_parse_50x10", |b| {
        b.iter(|| MemoryReader::from_manifest(black_box(&xml)))
    });
}

fn benchmark_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for interfaces in [10usize, 100] {
        let library = open_library(&synthetic_manifest(interfaces, 10)).expect("synthetic manifest");
        group.throughput(Throughput::Elements(library.len() as u64));

        for dialect in [Dialect::Winapi02, Dialect::Winapi03] {
            let generator = Generator::new().dialect(dialect);
            let mut out = Vec::with_capacity(256 * 1024);
            group.bench_with_input(
                BenchmarkId::new(dialect.as_str(), interfaces),
                &library,
                |b, library| {
                    b.iter(|| {
                        out.clear();
                        generator.generate(black_box(library), &mut out)
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_scalar_names,
    benchmark_manifest_parse,
    benchmark_generate,
);
criterion_main!(benches);
