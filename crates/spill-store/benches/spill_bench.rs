//! Benchmarks for spill list append and lookup.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use spill_store::{
    Datum, DiskUsageTracker, EncryptionMethod, FieldType, RowBatch, RowPtr, SpillConfig, SpillList,
};
use tempfile::TempDir;

struct NullTracker;

impl DiskUsageTracker for NullTracker {
    fn consume(&self, _delta: u64) {}
    fn release(&self, _total: u64) {}
}

fn fields() -> Arc<[FieldType]> {
    Arc::from([FieldType::String, FieldType::Int64])
}

fn sample_batch(rows: usize) -> RowBatch {
    let mut batch = RowBatch::new(fields());
    for i in 0..rows {
        batch.push(vec![
            Datum::String(format!("row-{i}-with-some-payload")),
            Datum::Int64(i as i64),
        ]);
    }
    batch
}

fn new_list(dir: &TempDir, encryption: EncryptionMethod) -> SpillList {
    let config = SpillConfig {
        spill_dir: dir.path().to_path_buf(),
        encryption,
    };
    SpillList::new(fields(), &config, Arc::new(NullTracker)).unwrap()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("spill_add");
    for (name, encryption) in [
        ("plaintext", EncryptionMethod::Plaintext),
        ("aes128ctr", EncryptionMethod::Aes128Ctr),
    ] {
        group.bench_function(name, |b| {
            let dir = TempDir::new().unwrap();
            let mut list = new_list(&dir, encryption);
            let batch = sample_batch(2);
            b.iter(|| list.add(black_box(&batch)).unwrap());
        });
    }
    group.finish();
}

fn bench_get_row(c: &mut Criterion) {
    let mut group = c.benchmark_group("spill_get_row");
    for (name, encryption) in [
        ("plaintext", EncryptionMethod::Plaintext),
        ("aes128ctr", EncryptionMethod::Aes128Ctr),
    ] {
        group.bench_function(name, |b| {
            let dir = TempDir::new().unwrap();
            let mut list = new_list(&dir, encryption);
            let batch = sample_batch(2);
            for _ in 0..10_000 {
                list.add(&batch).unwrap();
            }

            let mut rng = SmallRng::seed_from_u64(0);
            b.iter(|| {
                let ptr = RowPtr {
                    chunk_idx: rng.gen_range(0..10_000),
                    row_idx: rng.gen_range(0..2),
                };
                black_box(list.get_row(black_box(ptr)).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add, bench_get_row);
criterion_main!(benches);
