use criterion::{criterion_group, criterion_main, Criterion};
use search_core::eval::{intersect, union};
use search_core::tokenizer::tokenize;
use search_core::{build, evaluate, parse, RawDocument, Tokenizer, TokenizerConfig};

const TEXT: &str = "La Universidad Europea de Madrid ofrece grados, másteres y doctorados en su campus de \
Villaviciosa de Odón. Información sobre admisión, becas y titulaciones oficiales.";

fn bench_tokenize(c: &mut Criterion) {
    let text = TEXT.repeat(64);
    c.bench_function("tokenize_page", |b| b.iter(|| tokenize(&text)));
}

fn bench_merge(c: &mut Criterion) {
    let evens: Vec<u32> = (0..100_000).step_by(2).collect();
    let threes: Vec<u32> = (0..100_000).step_by(3).collect();
    c.bench_function("intersect_100k", |b| b.iter(|| intersect(&evens, &threes)));
    c.bench_function("union_100k", |b| b.iter(|| union(&evens, &threes)));
}

fn bench_evaluate(c: &mut Criterion) {
    let words = ["universidad", "campus", "madrid", "grado", "master", "beca", "admision", "privado"];
    let docs = (0..20_000).map(|i| {
        let text: Vec<&str> = words.iter().enumerate().filter(|(j, _)| i % (j + 2) == 0).map(|(_, w)| *w).collect();
        RawDocument::new(format!("https://ue.es/{i}"), format!("pages/{i}.json"), text.join(" "))
    });
    let index = build(docs, TokenizerConfig::default()).unwrap();
    let expr = parse("(universidad OR campus) AND madrid AND NOT privado", &Tokenizer::default()).unwrap();
    c.bench_function("evaluate_20k_docs", |b| b.iter(|| evaluate(&index, &expr)));
}

criterion_group!(benches, bench_tokenize, bench_merge, bench_evaluate);
criterion_main!(benches);
