//! Benchmarks for intent classification and syntax validation.

use codeflow::config::ClassifierConfig;
use codeflow::stages::{IntentClassifier, KeywordClassifier};
use codeflow::tools::check_python_syntax;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const PROBLEMS: [&str; 4] = [
    "Write a function that returns the n-th Fibonacci number",
    "optimize this, it throws a TypeError when the list is empty",
    "Please make this loop faster and reduce memory usage",
    "",
];

fn classifier_benchmark(c: &mut Criterion) {
    let classifier = match KeywordClassifier::new(&ClassifierConfig::default()) {
        Ok(classifier) => classifier,
        Err(err) => panic!("default keywords must compile: {err}"),
    };

    c.bench_function("keyword_classify", |b| {
        b.iter(|| {
            for problem in PROBLEMS {
                black_box(classifier.classify(black_box(problem)));
            }
        });
    });

    c.bench_function("keyword_compile", |b| {
        let config = ClassifierConfig::default();
        b.iter(|| black_box(KeywordClassifier::new(black_box(&config)).is_ok()));
    });
}

fn syntax_benchmark(c: &mut Criterion) {
    let source = "def add(a, b):\n    return a + b\n\nprint(add(1, 2))\n";
    c.bench_function("python_syntax_ok", |b| {
        b.iter(|| black_box(check_python_syntax(black_box(source))));
    });
}

criterion_group!(benches, classifier_benchmark, syntax_benchmark);
criterion_main!(benches);
