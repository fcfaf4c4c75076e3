use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use keyagent::cache::KeyCache;
use keyagent::types::{Identifier, KeyValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const APPS: u128 = 16;
const KEYS: u128 = 16;

fn id(n: u128) -> Identifier {
    Identifier::from_u128(n)
}

fn filled_cache() -> KeyCache {
    let mut cache = KeyCache::new(APPS as usize, KEYS as usize);
    let value = KeyValue::from_slice(&[7; 32]).unwrap();
    for app in 0..APPS {
        for key in 0..KEYS {
            cache.insert(id(app), id(key), value.clone()).unwrap();
        }
    }
    cache
}

fn bench_lookup_hit(c: &mut Criterion) {
    c.bench_function("key_cache_lookup_hit", |b| {
        b.iter_batched(
            filled_cache,
            |mut cache| {
                for n in 0..APPS * KEYS {
                    let app = id(n % APPS);
                    let key = id(n / APPS);
                    let _ = std::hint::black_box(cache.lookup(&app, &key));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lookup_miss(c: &mut Criterion) {
    c.bench_function("key_cache_lookup_miss", |b| {
        b.iter_batched(
            filled_cache,
            |mut cache| {
                for n in 0..APPS * KEYS {
                    let app = id(n % APPS);
                    let key = id(1_000 + n);
                    let _ = std::hint::black_box(cache.lookup(&app, &key));
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_application_eviction_churn(c: &mut Criterion) {
    let value = KeyValue::from_slice(&[1; 32]).unwrap();
    c.bench_function("key_cache_application_churn", |b| {
        b.iter_batched(
            filled_cache,
            |mut cache| {
                for n in 0..256u128 {
                    let outcome = cache.insert(id(10_000 + n), id(0), value.clone());
                    let _ = std::hint::black_box(outcome);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_key_eviction_churn(c: &mut Criterion) {
    let value = KeyValue::from_slice(&[2; 32]).unwrap();
    c.bench_function("key_cache_key_churn", |b| {
        b.iter_batched(
            filled_cache,
            |mut cache| {
                for n in 0..256u128 {
                    let outcome = cache.insert(id(n % APPS), id(10_000 + n), value.clone());
                    let _ = std::hint::black_box(outcome);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_random_mixed(c: &mut Criterion) {
    let value = KeyValue::from_slice(&[3; 32]).unwrap();
    c.bench_function("key_cache_random_mixed", |b| {
        b.iter_batched(
            || (filled_cache(), StdRng::seed_from_u64(0x6b74_61)),
            |(mut cache, mut rng)| {
                for _ in 0..1024 {
                    // twice the cached id space, so roughly half the lookups miss
                    let app = id(rng.gen_range(0..APPS * 2));
                    let key = id(rng.gen_range(0..KEYS * 2));
                    if cache.lookup(&app, &key).is_none() && rng.gen_bool(0.5) {
                        let _ = std::hint::black_box(cache.insert(app, key, value.clone()));
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_random_mixed,
    bench_lookup_hit,
    bench_lookup_miss,
    bench_application_eviction_churn,
    bench_key_eviction_churn
);
criterion_main!(benches);
