//! End-to-end known-answer scenarios across the configured engine.

use hex_literal::hex;
use shroud_core::bytes::constant_time_equal;
use shroud_engine::{
    confirm_keys, confirmation_output, decrypt, digest, encrypt, mac, registry::HashKind,
    AuthenticationFunctionConfiguration, CipherConfiguration,
};

// AES-128-CBC-PKCS7 over one NIST block: the first ciphertext block
// is the SP 800-38A value, the second is all padding.
#[test]
fn s1_aes_cbc_pkcs7() {
    let cfg = CipherConfiguration::block(
        "AES",
        "CBC",
        Some("PKCS7"),
        128,
        &hex!("000102030405060708090a0b0c0d0e0f"),
    );
    let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    let pt = hex!("6bc1bee22e409f96e93d7e117393172a");
    let ct = encrypt(&cfg, &key, &pt).unwrap();
    assert_eq!(ct.len(), 32);
    assert_eq!(&ct[..16], &hex!("7649abac8119b246cee98e9b12e9197d"));
    assert_eq!(decrypt(&cfg, &key, &ct).unwrap(), pt);
}

// AES-128-GCM with everything empty: the ciphertext is exactly the
// NIST tag.
#[test]
fn s2_aes_gcm_empty() {
    let cfg = CipherConfiguration::aead("AES", "GCM", 128, 128, &[0u8; 12], b"");
    let key = [0u8; 16];
    let ct = encrypt(&cfg, &key, b"").unwrap();
    assert_eq!(ct, hex!("58e2fccefa7e3061367f1d57a4e7455a"));
    assert_eq!(decrypt(&cfg, &key, &ct).unwrap(), b"");
}

// Salsa20/256 eSTREAM set 1 vector 0.
#[test]
fn s3_salsa20_estream() {
    let cfg = CipherConfiguration::stream("Salsa20", 256, &[0u8; 8]);
    let key = hex!("8000000000000000000000000000000000000000000000000000000000000000");
    let ct = encrypt(&cfg, &key, &[0u8; 64]).unwrap();
    assert_eq!(&ct[..8], &hex!("e3be8fdd8beca2e3"));
}

// BLAKE2b-512 of "abc" (RFC 7693).
#[test]
fn s4_blake2b_abc() {
    let d = digest(HashKind::Blake2b512, b"abc").unwrap();
    assert_eq!(
        d,
        hex!(
            "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1"
            "7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
        )
    );
}

// HMAC-SHA-256 (RFC 4231 case 1).
#[test]
fn s5_hmac_sha256() {
    let cfg = AuthenticationFunctionConfiguration::hmac("SHA256");
    let tag = mac(&cfg, &[0x0b; 20], b"Hi There").unwrap();
    assert!(constant_time_equal(
        &tag,
        &hex!("b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7")
    ));
}

// Key confirmation: exactly one of three candidates matches the
// pre-registered tag, whatever their order.
#[test]
fn s6_key_confirmation() {
    let mut cfg = AuthenticationFunctionConfiguration::hmac("SHA256");
    cfg.salt = Some(hex!("0102030405060708").to_vec());
    let candidates = vec![
        hex!("deadbeef").to_vec(),
        hex!("cafebabe").to_vec(),
        hex!("feedface").to_vec(),
    ];
    let expected = confirmation_output(&cfg, &candidates[2], 32).unwrap();
    let matched = confirm_keys(&cfg, &expected, &candidates).unwrap();
    assert_eq!(matched, hex!("feedface"));
    let mut shuffled = candidates.clone();
    shuffled.swap(0, 2);
    assert_eq!(
        confirm_keys(&cfg, &expected, &shuffled).unwrap(),
        hex!("feedface")
    );
    // no other candidate produces the same output
    let others: usize = candidates[..2]
        .iter()
        .map(|c| usize::from(confirmation_output(&cfg, c, 32).unwrap() == expected))
        .sum();
    assert_eq!(others, 0);
}
