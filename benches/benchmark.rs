use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use treedict::{AvlTree, RbTree, TreeKind, TreeMap};

const SIZES: [usize; 3] = [320, 640, 1280];

fn unique_keys(n: usize) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(0);
    let mut keys = Vec::with_capacity(n);
    let mut seen = std::collections::HashSet::with_capacity(n);
    while keys.len() < n {
        let key: i32 = rng.gen();
        if seen.insert(key) {
            keys.push(key);
        }
    }
    keys
}

pub fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for n in SIZES {
        let keys = unique_keys(n);

        group.bench_with_input(BenchmarkId::new("hash_map", n), &keys, |b, keys| {
            b.iter(|| {
                let mut map = HashMap::new();
                for key in keys {
                    map.insert(*key, *key);
                }
                black_box(map)
            })
        });

        group.bench_with_input(BenchmarkId::new("rb_tree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut tree = RbTree::new();
                for key in keys {
                    tree.insert(*key, *key);
                }
                black_box(tree)
            })
        });

        group.bench_with_input(BenchmarkId::new("avl_tree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut tree = AvlTree::new();
                for key in keys {
                    tree.insert(*key, *key);
                }
                black_box(tree)
            })
        });
    }
    group.finish();
}

pub fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    for n in SIZES {
        let keys = unique_keys(n);
        for kind in [TreeKind::Avl, TreeKind::RedBlack] {
            let mut map = TreeMap::new(kind);
            map.extend(keys.iter().map(|key| (*key, *key)));

            group.bench_with_input(BenchmarkId::new(kind.to_string(), n), &keys, |b, keys| {
                b.iter(|| {
                    for key in keys {
                        black_box(map.get(key));
                    }
                })
            });
        }
    }
    group.finish();
}

pub fn bench_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter");
    for n in SIZES {
        let keys = unique_keys(n);
        for kind in [TreeKind::Avl, TreeKind::RedBlack] {
            let mut map = TreeMap::new(kind);
            map.extend(keys.iter().map(|key| (*key, *key)));

            group.bench_function(BenchmarkId::new(kind.to_string(), n), |b| {
                b.iter(|| {
                    for (k, v) in &map {
                        black_box((k, v));
                    }
                })
            });
        }
    }
    group.finish();
}

pub fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    for n in SIZES {
        let keys = unique_keys(n);

        let mut avl = AvlTree::new();
        let mut rb = RbTree::new();
        for key in &keys {
            avl.insert(*key, *key);
            rb.insert(*key, *key);
        }

        group.bench_with_input(BenchmarkId::new("avl_tree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut tree = avl.clone();
                for key in keys {
                    tree.remove(key);
                }
                black_box(tree)
            })
        });

        group.bench_with_input(BenchmarkId::new("rb_tree", n), &keys, |b, keys| {
            b.iter(|| {
                let mut tree = rb.clone();
                for key in keys {
                    tree.remove(key);
                }
                black_box(tree)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_iter, bench_remove);
criterion_main!(benches);
