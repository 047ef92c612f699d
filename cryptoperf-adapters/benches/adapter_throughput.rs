use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cryptoperf_adapters::Adapter;
use cryptoperf_common::prelude::*;
use std::hint::black_box;

/// Deterministic filler so runs are comparable
fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

/// Symmetric encryption throughput across key sizes
fn bench_symmetric_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_encrypt");
    let data = sample(64 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for (algorithm, bits) in [
        (Algorithm::Aes, 128),
        (Algorithm::Aes, 256),
        (Algorithm::TripleDes, 192),
        (Algorithm::Blowfish, 128),
        (Algorithm::Rc4, 128),
    ] {
        let adapter = Adapter::new(algorithm, Some(KeySize::Bits(bits))).expect("adapter");
        group.bench_with_input(
            BenchmarkId::new(algorithm.name(), bits),
            &data,
            |b, data| b.iter(|| adapter.encrypt(black_box(data)).expect("encrypt")),
        );
    }
    group.finish();
}

/// Digest throughput
fn bench_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashing");
    let data = sample(1024 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for algorithm in [
        Algorithm::Sha256,
        Algorithm::Sha3_256,
        Algorithm::Shake128,
        Algorithm::Md5,
        Algorithm::HmacSha256,
    ] {
        let adapter = Adapter::new(algorithm, None).expect("adapter");
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm.name()),
            &data,
            |b, data| b.iter(|| adapter.hash(black_box(data)).expect("hash")),
        );
    }
    group.finish();
}

/// Signing latency on small messages
fn bench_signing(c: &mut Criterion) {
    let mut group = c.benchmark_group("signing");
    group.sample_size(20); // RSA signing is slow enough to keep this small
    let message = sample(200);

    let adapters = [
        Adapter::new(Algorithm::Rsa, Some(KeySize::Bits(2048))).expect("rsa"),
        Adapter::new(Algorithm::Ecc, Some(KeySize::Named("P-256".to_string()))).expect("p256"),
        Adapter::new(Algorithm::Ecc, Some(KeySize::Named("P-384".to_string()))).expect("p384"),
    ];
    for adapter in &adapters {
        let label = adapter
            .key_size()
            .map(|k| k.to_string())
            .unwrap_or_default();
        group.bench_with_input(
            BenchmarkId::new(adapter.algorithm().name(), label),
            &message,
            |b, message| b.iter(|| adapter.sign(black_box(message)).expect("sign")),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_symmetric_encrypt, bench_hashing, bench_signing);
criterion_main!(benches);
