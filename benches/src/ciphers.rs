use benches::{black_box, criterion_group, criterion_main, Criterion, Throughput, SIZES};
use shroud_core::Direction;
use shroud_engine::{build_cipher_wrapper, encrypt, CipherConfiguration};

fn bench_one_shot(c: &mut Criterion, label: &str, cfg: &CipherConfiguration, key: &[u8]) {
    let mut group = c.benchmark_group(label);
    for &size in SIZES {
        let data = vec![0xa5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{size}"), |b| {
            b.iter(|| encrypt(black_box(cfg), black_box(key), black_box(&data)).unwrap())
        });
    }
    group.finish();
}

fn ciphers(c: &mut Criterion) {
    bench_one_shot(
        c,
        "aes-256-ctr",
        &CipherConfiguration::block("AES", "CTR", None, 256, &[0u8; 16]),
        &[7u8; 32],
    );
    bench_one_shot(
        c,
        "aes-128-gcm",
        &CipherConfiguration::aead("AES", "GCM", 128, 128, &[0u8; 12], b""),
        &[7u8; 16],
    );
    bench_one_shot(
        c,
        "salsa20-256",
        &CipherConfiguration::stream("Salsa20", 256, &[0u8; 8]),
        &[7u8; 32],
    );
    bench_one_shot(
        c,
        "hc-128",
        &CipherConfiguration::stream("HC128", 128, &[0u8; 16]),
        &[7u8; 16],
    );

    // wrapper setup cost on its own
    c.bench_function("pipeline-setup/aes-256-gcm", |b| {
        let cfg = CipherConfiguration::aead("AES", "GCM", 256, 128, &[0u8; 12], b"");
        b.iter(|| build_cipher_wrapper(black_box(&cfg), &[1u8; 32], Direction::Encrypt).unwrap())
    });
}

criterion_group!(benches, ciphers);
criterion_main!(benches);
