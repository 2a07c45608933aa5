mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gpc::{lexer, parser};

fn bench_frontend(c: &mut Criterion) {
    let toolchain = common::toolchain();

    for (label, source) in common::workloads("frontend") {
        let tokens = lexer::tokenize(toolchain.tokens(), &source).expect("tokenize");

        c.bench_function(&format!("frontend_tokenize_{label}"), |b| {
            b.iter(|| {
                let out = lexer::tokenize(toolchain.tokens(), black_box(&source)).expect("tokenize");
                black_box(out);
            })
        });

        c.bench_function(&format!("frontend_parse_only_{label}"), |b| {
            b.iter(|| {
                let out = parser::parse(black_box(&tokens), toolchain.grammar()).expect("parse");
                black_box(out);
            })
        });

        c.bench_function(&format!("frontend_tokenize_parse_{label}"), |b| {
            b.iter(|| {
                let out = toolchain.parse(black_box(&source)).expect("parse");
                black_box(out);
            })
        });
    }
}

criterion_group!(benches, bench_frontend);
criterion_main!(benches);
