use criterion::{criterion_group, criterion_main, Criterion};
use std::path::PathBuf;

fn bench_codec(c: &mut Criterion) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/catalog.yaml");
    let catalog = camo_catalog::load(path).unwrap();
    let model = camo_core::ProgressModel::from_catalog(&catalog);
    let text = persistence::encode(&model).unwrap();
    c.bench_function("encode_progress", |b| {
        b.iter(|| {
            let _ = persistence::encode(&model);
        })
    });
    c.bench_function("decode_progress", |b| {
        b.iter(|| {
            let _ = persistence::decode(&text);
        })
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
