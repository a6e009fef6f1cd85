use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_lnt::{from_slice, to_vec, Value};

#[derive(Serialize, Deserialize, Clone)]
struct User {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Clone)]
struct Sample {
    x: i32,
    y: i32,
    z: i32,
}

fn user() -> User {
    User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        active: true,
    }
}

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
        })
        .collect()
}

fn benchmark_serialize_simple(c: &mut Criterion) {
    let user = user();
    c.bench_function("serialize_simple_struct", |b| {
        b.iter(|| to_vec(black_box(&user)))
    });
}

fn benchmark_deserialize_simple(c: &mut Criterion) {
    let bytes = to_vec(&user()).unwrap();
    c.bench_function("deserialize_simple_struct", |b| {
        b.iter(|| from_slice::<User>(black_box(&bytes)))
    });
}

fn benchmark_serialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_array");

    for size in [10, 50, 100, 500].iter() {
        let products = products(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| to_vec(black_box(&products)))
        });
    }
    group.finish();
}

fn benchmark_deserialize_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize_array");

    for size in [10, 50, 100, 500].iter() {
        let bytes = to_vec(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| from_slice::<Vec<Product>>(black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_uniform_samples(c: &mut Criterion) {
    let mut group = c.benchmark_group("uniform_samples");

    let samples: Vec<Sample> = (0..1000)
        .map(|i| Sample {
            x: i,
            y: -i,
            z: i * 2,
        })
        .collect();
    let bytes = to_vec(&samples).unwrap();

    group.bench_function("serialize", |b| b.iter(|| to_vec(black_box(&samples))));
    group.bench_function("deserialize", |b| {
        b.iter(|| from_slice::<Vec<Sample>>(black_box(&bytes)))
    });
    group.bench_function("deserialize_value", |b| {
        b.iter(|| from_slice::<Value>(black_box(&bytes)))
    });

    group.finish();
}

fn benchmark_primitive_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_array");

    let numbers: Vec<i32> = (0..100).collect();
    let bools: Vec<bool> = (0..100).map(|i| i % 2 == 0).collect();
    let floats: Vec<f64> = (0..100).map(|i| i as f64 * 1.5).collect();

    group.bench_function("serialize_integers", |b| {
        b.iter(|| to_vec(black_box(&numbers)))
    });

    group.bench_function("serialize_booleans", |b| {
        b.iter(|| to_vec(black_box(&bools)))
    });

    group.bench_function("serialize_floats", |b| {
        b.iter(|| to_vec(black_box(&floats)))
    });

    let numbers_bytes = to_vec(&numbers).unwrap();
    let bools_bytes = to_vec(&bools).unwrap();
    let floats_bytes = to_vec(&floats).unwrap();

    group.bench_function("deserialize_integers", |b| {
        b.iter(|| from_slice::<Vec<i32>>(black_box(&numbers_bytes)))
    });

    group.bench_function("deserialize_booleans", |b| {
        b.iter(|| from_slice::<Vec<bool>>(black_box(&bools_bytes)))
    });

    group.bench_function("deserialize_floats", |b| {
        b.iter(|| from_slice::<Vec<f64>>(black_box(&floats_bytes)))
    });

    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let products = products(100);

    let mut group = c.benchmark_group("comparison");

    group.bench_function("lnt_serialize", |b| {
        b.iter(|| serde_lnt::to_vec(black_box(&products)))
    });

    group.bench_function("json_serialize", |b| {
        b.iter(|| serde_json::to_vec(black_box(&products)))
    });

    let lnt_bytes = serde_lnt::to_vec(&products).unwrap();
    let json_bytes = serde_json::to_vec(&products).unwrap();

    group.bench_function("lnt_deserialize", |b| {
        b.iter(|| serde_lnt::from_slice::<Vec<Product>>(black_box(&lnt_bytes)))
    });

    group.bench_function("json_deserialize", |b| {
        b.iter(|| serde_json::from_slice::<Vec<Product>>(black_box(&json_bytes)))
    });

    group.finish();
}

fn benchmark_roundtrip(c: &mut Criterion) {
    let user = user();

    c.bench_function("roundtrip_simple", |b| {
        b.iter(|| {
            let serialized = to_vec(black_box(&user)).unwrap();
            let _deserialized: User = from_slice(black_box(&serialized)).unwrap();
        })
    });
}

criterion_group!(
    benches,
    benchmark_serialize_simple,
    benchmark_deserialize_simple,
    benchmark_serialize_array,
    benchmark_deserialize_array,
    benchmark_uniform_samples,
    benchmark_primitive_array,
    benchmark_comparison_with_json,
    benchmark_roundtrip
);
criterion_main!(benches);
