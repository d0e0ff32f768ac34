use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use memsearch::core::types::ScanCriteria;
use memsearch::memory::{find_matches, ScanOptions, SnapshotAccess, SnapshotProcess};
use memsearch::{NumericType, Operator, ScanEngine, TypedValue};

const REGION_SIZE: usize = 1 << 20;

fn region_data(seed: u8) -> Vec<u8> {
    (0..REGION_SIZE)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn benchmark_find_matches(c: &mut Criterion) {
    let buffer = region_data(7);
    let mut group = c.benchmark_group("find_matches");
    group.throughput(Throughput::Bytes(buffer.len() as u64));

    for (name, ty, operator) in [
        ("int32_equal", NumericType::Int32, Operator::Equal),
        ("int32_greater", NumericType::Int32, Operator::Greater),
        ("float64_less", NumericType::Float64, Operator::Less),
    ] {
        let criteria = ScanCriteria::new(TypedValue::new(ty, 1000.0).unwrap(), operator);
        group.bench_with_input(BenchmarkId::from_parameter(name), &criteria, |b, criteria| {
            b.iter(|| find_matches(black_box(&buffer), criteria));
        });
    }
    group.finish();
}

fn benchmark_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    group.throughput(Throughput::Bytes((REGION_SIZE * 16) as u64));
    group.sample_size(20);

    for parallel in [false, true] {
        let process = SnapshotProcess::new(1);
        for i in 0..16u8 {
            process.add_region((0x1000_0000 + i as usize * 0x20_0000).into(), region_data(i));
        }
        let mut access = SnapshotAccess::new();
        access.insert(process);

        let options = ScanOptions {
            parallel,
            chunk_size: 1 << 16,
            ..ScanOptions::default()
        };
        let engine = ScanEngine::new(access, options).unwrap();
        let target = TypedValue::new(NumericType::Int32, 0x1F3E5D7C as f64).unwrap();

        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_function(label, |b| {
            b.iter(|| engine.scan(1, black_box(&target), Operator::Equal, &[]).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_find_matches, benchmark_full_scan);
criterion_main!(benches);
