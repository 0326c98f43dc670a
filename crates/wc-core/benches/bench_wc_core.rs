use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use serde_json::json;
use wc_core::Value;

fn bench_value_conversion(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let rows: Vec<serde_json::Value> = (0..1000)
        .map(|i| {
            json!({
                "title": format!("Article {i}"),
                "wordCount": rng.gen_range(0..10_000),
                "score": rng.gen::<f64>(),
                "publishedAt": format!("2024-01-{:02}T10:00:00Z", (i % 28) + 1),
                "tags": ["news", "rust"],
            })
        })
        .collect();

    c.bench_function("value_from_json_1000_rows", |b| {
        b.iter(|| {
            for row in &rows {
                black_box(Value::from(row.clone()));
            }
        })
    });

    let values: Vec<Value> = rows.iter().cloned().map(Value::from).collect();
    c.bench_function("value_to_json_1000_rows", |b| {
        b.iter(|| {
            for v in &values {
                black_box(v.to_json());
            }
        })
    });
}

criterion_group!(benches, bench_value_conversion);
criterion_main!(benches);
