//! Engine-wide properties: round trips, length laws, streaming
//! equivalence and tamper detection over every registered
//! configuration family.

use quickcheck::{quickcheck, TestResult};
use shroud_core::{CryptoError, Direction};
use shroud_engine::{
    build_cipher_wrapper, decrypt, encrypt, registry::BlockCipherKind,
    registry::StreamCipherKind, CipherConfiguration, CryptoReader, CryptoWriter,
};
use std::io::{Read, Write};

fn key_of(bits: u32, fill: u8) -> Vec<u8> {
    vec![fill; (bits / 8) as usize]
}

fn block_configs() -> Vec<(CipherConfiguration, Vec<u8>)> {
    let mut out = Vec::new();
    for kind in BlockCipherKind::ALL {
        let desc = kind.descriptor();
        let bits = desc.default_key_size_bits;
        let iv = vec![7u8; (desc.default_block_size_bits / 8) as usize];
        for mode in ["CBC", "CTR", "CFB", "OFB"] {
            let padding = if mode == "CBC" { Some("PKCS7") } else { None };
            out.push((
                CipherConfiguration::block(kind.name(), mode, padding, bits, &iv),
                key_of(bits, 0x33),
            ));
        }
    }
    out
}

fn stream_configs() -> Vec<(CipherConfiguration, Vec<u8>)> {
    StreamCipherKind::ALL
        .iter()
        .map(|kind| {
            let desc = kind.descriptor();
            let bits = desc.default_key_size_bits;
            let nonce = vec![9u8; (desc.default_iv_size_bits / 8) as usize];
            (
                CipherConfiguration::stream(kind.name(), bits, &nonce),
                key_of(bits, 0x44),
            )
        })
        .collect()
}

fn aead_configs() -> Vec<(CipherConfiguration, Vec<u8>)> {
    vec![
        (
            CipherConfiguration::aead("AES", "GCM", 256, 128, &[1u8; 12], b"aad bytes"),
            key_of(256, 0x55),
        ),
        (
            CipherConfiguration::aead("Twofish", "GCM", 128, 128, &[2u8; 12], b""),
            key_of(128, 0x66),
        ),
        (
            CipherConfiguration::aead("AES", "EAX", 128, 64, &[3u8; 16], b"h"),
            key_of(128, 0x77),
        ),
        (
            CipherConfiguration::aead("Serpent", "EAX", 256, 128, &[4u8; 8], b"hdr"),
            key_of(256, 0x88),
        ),
    ]
}

#[test]
fn round_trip_every_block_configuration() {
    for (cfg, key) in block_configs() {
        for len in [0usize, 1, 7, 8, 15, 16, 17, 64, 255] {
            let pt: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ct = encrypt(&cfg, &key, &pt).unwrap();
            let back = decrypt(&cfg, &key, &ct).unwrap();
            assert_eq!(back, pt, "{} {}", cfg.cipher_name, len);
            let bs = (cfg.iv.len()) as usize;
            if cfg.mode_name.as_deref() == Some("CBC") {
                // padded length law
                assert_eq!(ct.len(), (len / bs + 1) * bs);
            } else {
                // partial-block-capable length law
                assert_eq!(ct.len(), len);
            }
        }
    }
}

#[test]
fn round_trip_every_stream_configuration() {
    for (cfg, key) in stream_configs() {
        for len in [0usize, 1, 63, 64, 65, 333] {
            let pt: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let ct = encrypt(&cfg, &key, &pt).unwrap();
            assert_eq!(ct.len(), len, "{}", cfg.cipher_name);
            assert_eq!(decrypt(&cfg, &key, &ct).unwrap(), pt);
        }
    }
}

#[test]
fn round_trip_and_tag_length_every_aead_configuration() {
    for (cfg, key) in aead_configs() {
        let mac_len = (cfg.mac_size_bits.unwrap() / 8) as usize;
        for len in [0usize, 1, 16, 31, 32, 100] {
            let pt: Vec<u8> = (0..len).map(|i| (i * 3) as u8).collect();
            let ct = encrypt(&cfg, &key, &pt).unwrap();
            assert_eq!(ct.len(), len + mac_len);
            assert_eq!(decrypt(&cfg, &key, &ct).unwrap(), pt);
        }
    }
}

#[test]
fn aead_single_bit_tamper_always_fails() {
    for (cfg, key) in aead_configs() {
        let pt = b"authenticated payload".to_vec();
        let ct = encrypt(&cfg, &key, &pt).unwrap();
        for byte in 0..ct.len() {
            let mut bad = ct.clone();
            bad[byte] ^= 1;
            assert_eq!(
                decrypt(&cfg, &key, &bad).unwrap_err(),
                CryptoError::CiphertextAuthentication,
                "{} byte {}",
                cfg.cipher_name,
                byte
            );
        }
    }
}

#[test]
fn encryption_is_deterministic() {
    for (cfg, key) in block_configs().into_iter().chain(aead_configs()) {
        let pt = b"determinism probe".to_vec();
        assert_eq!(
            encrypt(&cfg, &key, &pt).unwrap(),
            encrypt(&cfg, &key, &pt).unwrap()
        );
    }
}

quickcheck! {
    // any chunking of the input produces the byte-identical stream
    fn streaming_equals_one_shot(data: Vec<u8>, cuts: Vec<u8>) -> TestResult {
        let cfg = CipherConfiguration::aead("AES", "GCM", 128, 128, &[5u8; 12], b"qc");
        let key = [6u8; 16];
        let expected = encrypt(&cfg, &key, &data).unwrap();

        let wrapper = build_cipher_wrapper(&cfg, &key, Direction::Encrypt).unwrap();
        let mut w = CryptoWriter::new(Vec::new(), wrapper, Direction::Encrypt);
        let mut rest: &[u8] = &data;
        for cut in cuts {
            let n = (cut as usize).min(rest.len());
            let (chunk, tail) = rest.split_at(n);
            w.write_all(chunk).unwrap();
            rest = tail;
        }
        w.write_all(rest).unwrap();
        let streamed = w.finish().unwrap();
        TestResult::from_bool(streamed == expected)
    }

    fn ctr_xor_property(p: Vec<u8>, q: Vec<u8>) -> TestResult {
        if p.len() != q.len() {
            return TestResult::discard();
        }
        let cfg = CipherConfiguration::block("AES", "CTR", None, 128, &[8u8; 16]);
        let key = [1u8; 16];
        let cp = encrypt(&cfg, &key, &p).unwrap();
        let cq = encrypt(&cfg, &key, &q).unwrap();
        let ok = cp
            .iter()
            .zip(&cq)
            .zip(p.iter().zip(&q))
            .all(|((a, b), (x, y))| a ^ b == x ^ y);
        TestResult::from_bool(ok)
    }

    fn reader_writer_agree(data: Vec<u8>) -> bool {
        let cfg = CipherConfiguration::block("Serpent", "CBC", Some("X923"), 256, &[2u8; 16]);
        let key = [3u8; 32];
        let wrapper = build_cipher_wrapper(&cfg, &key, Direction::Encrypt).unwrap();
        let mut w = CryptoWriter::new(Vec::new(), wrapper, Direction::Encrypt);
        w.write_all(&data).unwrap();
        let ct = w.finish().unwrap();

        let wrapper = build_cipher_wrapper(&cfg, &key, Direction::Decrypt).unwrap();
        let mut r = CryptoReader::new(ct.as_slice(), wrapper, Direction::Decrypt);
        let mut back = Vec::new();
        r.read_to_end(&mut back).unwrap();
        back == data
    }
}

#[test]
fn registry_totality_over_factories() {
    use shroud_engine::registry::*;
    use std::str::FromStr;
    // every kind builds through its factory with descriptor defaults
    for kind in BlockCipherKind::ALL {
        let d = kind.descriptor();
        let key = vec![1u8; (d.default_key_size_bits / 8) as usize];
        assert!(
            shroud_engine::build_block_cipher(*kind, &key).is_ok(),
            "{}",
            kind.name()
        );
    }
    for kind in StreamCipherKind::ALL {
        let d = kind.descriptor();
        let key = vec![1u8; (d.default_key_size_bits / 8) as usize];
        let iv = vec![2u8; (d.default_iv_size_bits / 8) as usize];
        assert!(
            shroud_engine::build_stream_cipher(*kind, &key, &iv).is_ok(),
            "{}",
            kind.name()
        );
    }
    for kind in HashKind::ALL {
        assert!(shroud_engine::build_digest(*kind).is_ok());
        assert!(HashKind::from_str(kind.name()).is_ok());
    }
    for kind in KdfKind::ALL {
        assert!(shroud_engine::build_kdf(*kind).is_ok());
    }
}
