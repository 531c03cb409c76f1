use criterion::{criterion_group, criterion_main, Criterion};
use gosp::{gen, parser::parse_program};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/factorial.gosp");

fn criterion_benchmark(c: &mut Criterion) {
    let forms = parse_program(INPUT, &mut Vec::new()).unwrap();

    c.bench_function("gen", |b| {
        b.iter(|| {
            let file = gen::generate(black_box(&forms)).unwrap();
            _ = black_box(file);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
