use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hashindex::{Attribute, FieldAccess, IndexSet, Value};
use std::collections::HashMap;

#[derive(Clone)]
struct Record {
    group: u64,
    tag: &'static str,
}

impl FieldAccess for Record {
    fn field(&self, name: &str) -> Value {
        match name {
            "group" => Value::UInt(self.group),
            "tag" => Value::str(self.tag),
            _ => Value::Missing,
        }
    }
}

const TAGS: &[&str] = &["alpha", "beta", "gamma", "delta"];

fn build_uniform(n: u64) -> IndexSet<Record> {
    let objects = (0..n).map(|i| Record {
        group: i,
        tag: TAGS[(i % TAGS.len() as u64) as usize],
    });
    IndexSet::new(objects, [Attribute::named("group"), Attribute::named("tag")])
}

fn build_collision_heavy(n: u64) -> IndexSet<Record> {
    // Every object shares one of four `group` values, forcing dense hash collisions inside
    // the `group` attribute's buckets and repeated `DictBucket` conversions.
    let objects = (0..n).map(|i| Record {
        group: i % 4,
        tag: TAGS[(i % TAGS.len() as u64) as usize],
    });
    IndexSet::new(objects, [Attribute::named("group"), Attribute::named("tag")])
}

fn bench_add_uniform(c: &mut Criterion) {
    c.bench_function("add_uniform_10k", |b| {
        b.iter(|| {
            let mut set: IndexSet<Record> =
                IndexSet::new(std::iter::empty(), [Attribute::named("group"), Attribute::named("tag")]);
            for i in 0..10_000u64 {
                set.add(Record {
                    group: i,
                    tag: TAGS[(i % TAGS.len() as u64) as usize],
                });
            }
            black_box(set.len());
        });
    });
}

fn bench_add_collision_heavy(c: &mut Criterion) {
    c.bench_function("add_collision_heavy_10k", |b| {
        b.iter(|| {
            let mut set: IndexSet<Record> =
                IndexSet::new(std::iter::empty(), [Attribute::named("group"), Attribute::named("tag")]);
            for i in 0..10_000u64 {
                set.add(Record {
                    group: i % 4,
                    tag: TAGS[(i % TAGS.len() as u64) as usize],
                });
            }
            black_box(set.len());
        });
    });
}

fn bench_find_uniform(c: &mut Criterion) {
    let set = build_uniform(10_000);
    let mut q = HashMap::new();
    q.insert("tag".to_string(), Value::str("gamma").into());
    c.bench_function("find_uniform_10k", |b| {
        b.iter(|| black_box(set.find(Some(&q), None).unwrap()));
    });
}

fn bench_find_collision_heavy(c: &mut Criterion) {
    let set = build_collision_heavy(10_000);
    let mut q = HashMap::new();
    q.insert("group".to_string(), Value::UInt(2).into());
    c.bench_function("find_collision_heavy_10k", |b| {
        b.iter(|| black_box(set.find(Some(&q), None).unwrap()));
    });
}

fn bench_remove_and_readd(c: &mut Criterion) {
    c.bench_function("remove_and_readd_1k", |b| {
        b.iter_batched(
            || build_uniform(1_000),
            |mut set| {
                let ids: Vec<u64> = set.iter().map(|(id, _)| id).collect();
                for id in ids {
                    let obj = set.remove(id).unwrap();
                    black_box(set.add(obj));
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_add_uniform,
    bench_add_collision_heavy,
    bench_find_uniform,
    bench_find_collision_heavy,
    bench_remove_and_readd,
);
criterion_main!(benches);
