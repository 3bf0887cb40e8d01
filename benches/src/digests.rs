use benches::{black_box, criterion_group, criterion_main, Criterion, Throughput, SIZES};
use shroud_engine::{digest, mac, registry::HashKind, AuthenticationFunctionConfiguration};

fn digests(c: &mut Criterion) {
    for (label, kind) in [
        ("blake2b-512", HashKind::Blake2b512),
        ("keccak-256", HashKind::Keccak256),
        ("sha-256", HashKind::Sha256),
        ("whirlpool", HashKind::Whirlpool),
        ("tiger", HashKind::Tiger),
    ] {
        let mut group = c.benchmark_group(label);
        for &size in SIZES {
            let data = vec![0x5au8; size];
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_function(format!("{size}"), |b| {
                b.iter(|| digest(black_box(kind), black_box(&data)).unwrap())
            });
        }
        group.finish();
    }

    let hmac = AuthenticationFunctionConfiguration::hmac("SHA256");
    let cmac = AuthenticationFunctionConfiguration::cmac("AES");
    let data = vec![0u8; 1024];
    c.bench_function("hmac-sha256/1024", |b| {
        b.iter(|| mac(black_box(&hmac), &[1u8; 32], black_box(&data)).unwrap())
    });
    c.bench_function("cmac-aes/1024", |b| {
        b.iter(|| mac(black_box(&cmac), &[1u8; 16], black_box(&data)).unwrap())
    });
}

criterion_group!(benches, digests);
criterion_main!(benches);
