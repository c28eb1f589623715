//! Benchmarks for propdocx segmentation and rendering.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic proposal text of increasing length.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use propdocx::{segment, DocxRenderer, RenderContext, Template};

/// Creates synthetic proposal text with the given number of sections.
fn create_test_text(sections: usize) -> String {
    let mut text = String::new();

    for i in 0..sections {
        text.push_str(&format!("## Section {}\n", i + 1));
        text.push_str("This section explains the **approach** and the _expected_ outcome.\n\n");
        text.push_str("### Deliverables\n");
        for j in 0..5 {
            text.push_str(&format!("- Deliverable {} with **bold** detail\n", j + 1));
        }
        text.push('\n');
        for j in 0..3 {
            text.push_str(&format!("{}. Milestone {}\n", j + 1, j + 1));
        }
        text.push('\n');
        text.push_str("| Item | Cost | Weeks |\n|---|---|---|\n");
        for j in 0..4 {
            text.push_str(&format!("| Work package {} | {} | {} |\n", j + 1, (j + 1) * 1000, j + 2));
        }
        text.push('\n');
        text.push_str(
            r#"{"table": "Budget", "columns": ["Phase", "Cost"], "rows": [["Design", 1000], ["Build", 5000]]}"#,
        );
        text.push_str("\n\n");
    }

    text
}

fn benchmark_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    for sections in [1, 10, 50] {
        let text = create_test_text(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &text, |b, text| {
            b.iter(|| segment(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let template = Template::builtin();
    let renderer = DocxRenderer::default();
    let date = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
    let context = RenderContext::new("ACME", "Benchmark Proposal", date);

    for sections in [1, 10, 50] {
        let blocks = segment(&create_test_text(sections));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &blocks, |b, blocks| {
            b.iter(|| {
                renderer
                    .render(black_box(&template), black_box(blocks), &context)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn benchmark_template_load(c: &mut Criterion) {
    let bytes = Template::builtin().to_bytes().unwrap();

    c.bench_function("template_from_bytes", |b| {
        b.iter(|| Template::from_bytes(black_box(&bytes)).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_segment,
    benchmark_render,
    benchmark_template_load
);
criterion_main!(benches);
