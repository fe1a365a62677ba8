//! Diagram Resolution Benchmarks
//!
//! Performance benchmarks for the pure resolver functions that run once
//! per pipeline stage over the full corrected document.
//!
//! Run with: `cargo bench --bench diagram_resolution`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use prashna_server::diagram::{
    extract_paper_code, find_diagram_questions, normalize_key, PaperTemplates,
};

/// Build a corrected document of the given line count with a paper code in
/// the header and a handful of diagram questions spread through it.
fn synthetic_document(lines: usize) -> String {
    let mut out = String::from("SEE 2080 Compulsory Mathematics RE-109P'1\n");
    for i in 0..lines {
        if i % 40 == 0 {
            out.push_str(&format!(
                "{}. (a) In the figure given below, compute the shaded area.\n",
                i / 40 + 2
            ));
        } else {
            out.push_str(&format!("{}. Solve the following equation. (2×1=2)\n", i));
        }
    }
    out
}

fn bench_extract_paper_code(c: &mut Criterion) {
    let document = synthetic_document(200);

    c.bench_function("extract_paper_code_200_lines", |b| {
        b.iter(|| extract_paper_code(black_box(&document)))
    });
}

fn bench_find_diagram_questions(c: &mut Criterion) {
    let document = synthetic_document(200);

    c.bench_function("find_diagram_questions_200_lines", |b| {
        b.iter(|| find_diagram_questions(black_box(&document)))
    });
}

fn bench_lookup(c: &mut Criterion) {
    let templates = PaperTemplates::builtin();

    c.bench_function("template_lookup", |b| {
        b.iter(|| templates.lookup(black_box("RE-109P'1"), black_box("3(a)")))
    });

    c.bench_function("normalize_key", |b| {
        b.iter(|| normalize_key(black_box("3(a)")))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_extract_paper_code, bench_find_diagram_questions, bench_lookup
}
criterion_main!(benches);
