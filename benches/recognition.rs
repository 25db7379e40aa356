//! Benchmarks for the text-to-EPUB pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;
use std::io::Cursor;

use criterion::{Criterion, criterion_group, criterion_main};

use novelbind::{DecodeOptions, Metadata, RuleSet, assemble, normalize, recognize, write_epub_to_writer};

/// A synthetic novel: 10 volumes of 50 chapters, 40 paragraphs each.
fn sample_novel() -> String {
    let mut text = String::from("内容简介：这是一本用于基准测试的小说。\n\n");
    for volume in 1..=10 {
        text.push_str(&format!("第{volume}卷 远行\n"));
        for chapter in 1..=50 {
            text.push_str(&format!("第{chapter}章   风起云涌\n"));
            for paragraph in 0..40 {
                text.push_str(&format!("　　他沿着河岸走了很久，第{paragraph}次回头时，天已经黑了。\n"));
            }
            text.push('\n');
        }
    }
    text
}

// ============================================================================
// Recognition Benchmarks
// ============================================================================

fn bench_normalize(c: &mut Criterion) {
    let text = sample_novel();
    let bytes = text.as_bytes();
    let options = DecodeOptions::default();
    c.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box(bytes), &options).unwrap());
    });

    let (gbk, _, _) = encoding_rs::GBK.encode(&text);
    c.bench_function("normalize_gbk", |b| {
        b.iter(|| normalize(black_box(&gbk), &options).unwrap());
    });
}

fn bench_recognize(c: &mut Criterion) {
    let lines = normalize(sample_novel().as_bytes(), &DecodeOptions::default()).unwrap().lines;
    let rules = RuleSet::default();
    c.bench_function("recognize", |b| {
        b.iter(|| recognize(black_box(&lines), &rules).unwrap());
    });
}

fn bench_classify(c: &mut Criterion) {
    let rules = RuleSet::default();
    c.bench_function("classify_heading", |b| {
        b.iter(|| rules.classify_text(black_box("第一百二十三章 风起云涌")));
    });
    c.bench_function("classify_body", |b| {
        b.iter(|| rules.classify_text(black_box("　　他沿着河岸走了很久，回头时，天已经黑了。")));
    });
}

// ============================================================================
// Packaging Benchmarks
// ============================================================================

fn bench_write_epub(c: &mut Criterion) {
    let lines = normalize(sample_novel().as_bytes(), &DecodeOptions::default()).unwrap().lines;
    let outline = recognize(&lines, &RuleSet::default()).unwrap();
    let metadata = Metadata::new("基准").with_modified("2024-01-01T00:00:00Z");
    let book = assemble(&outline, &metadata, None);

    c.bench_function("assemble", |b| {
        b.iter(|| assemble(black_box(&outline), &metadata, None));
    });
    c.bench_function("write_epub", |b| {
        b.iter(|| {
            let mut buffer = Cursor::new(Vec::new());
            write_epub_to_writer(black_box(&book), &mut buffer).unwrap();
            buffer
        });
    });
}

criterion_group!(benches, bench_normalize, bench_recognize, bench_classify, bench_write_epub);
criterion_main!(benches);
