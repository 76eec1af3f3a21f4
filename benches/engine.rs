use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use ll1_tutor::{Generator, GeneratorConfig, PredictiveParser};

fn bench_parse(c: &mut Criterion) {
    let parser = PredictiveParser::standard().unwrap();

    c.bench_function("parse accepted", |b| {
        b.iter(|| parser.parse(black_box("cbcaacbbc")).unwrap())
    });
    c.bench_function("parse rejected", |b| {
        b.iter(|| parser.parse(black_box("aab")).unwrap())
    });
}

fn bench_generate(c: &mut Criterion) {
    let parser = PredictiveParser::standard().unwrap();
    let config = GeneratorConfig {
        seed: Some(17),
        ..GeneratorConfig::default()
    };
    let mut generator = Generator::new(parser.grammar(), config);

    c.bench_function("generate", |b| b.iter(|| generator.generate().unwrap()));
}

criterion_group!(benches, bench_parse, bench_generate);
criterion_main!(benches);
