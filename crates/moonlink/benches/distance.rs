use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use moonlink::memory::{MemoryState, TableRef};
use moonlink::{Converter, DefaultConverter, HostType, StackAccess};

fn bench_scalar_distance(c: &mut Criterion) {
    let converter = DefaultConverter::default();
    let mut state = MemoryState::new();
    state.push(42i64).unwrap();
    state.push("42").unwrap();

    let mut group = c.benchmark_group("distance");
    for (name, index, target) in [
        ("number_to_i32", 1, HostType::I32),
        ("number_to_text", 1, HostType::Text),
        ("string_to_any", 2, HostType::Any),
        ("string_to_bool", 2, HostType::Bool),
    ] {
        group.bench_with_input(BenchmarkId::new("scalar", name), &target, |b, target| {
            b.iter(|| converter.distance(black_box(&state), black_box(index), target));
        });
    }
    group.finish();
}

fn bench_signature(c: &mut Criterion) {
    let converter = DefaultConverter::default();
    let mut state = MemoryState::new();
    state.push(1i64).unwrap();
    state.push("name").unwrap();
    state.push(true).unwrap();
    state.push(TableRef::new()).unwrap();

    let candidates = [
        vec![HostType::I32, HostType::Text, HostType::Bool, HostType::Map],
        vec![HostType::Text, HostType::I64, HostType::Any, HostType::List],
        vec![HostType::F64, HostType::Bytes, HostType::Bool, HostType::array_of(HostType::I32)],
    ];

    c.bench_function("signature_overloads", |b| {
        b.iter(|| {
            candidates
                .iter()
                .map(|params| converter.signature_distance(black_box(&state), 1, params))
                .min()
        });
    });
}

fn bench_array_import(c: &mut Criterion) {
    let converter = DefaultConverter::default();
    let mut group = c.benchmark_group("array_import");

    for len in [16usize, 256, 4096] {
        let mut state = MemoryState::new();
        state
            .push(TableRef::from_sequence((0..len as i64).collect::<Vec<_>>()))
            .unwrap();
        let target = HostType::array_of(HostType::I32);

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("i32", len), &len, |b, _| {
            b.iter(|| {
                let value = converter.to_host(&mut state, 1, &target).unwrap();
                debug_assert_eq!(state.top(), 1);
                value
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scalar_distance, bench_signature, bench_array_import);
criterion_main!(benches);
