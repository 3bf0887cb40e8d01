//! Encrypt-then-MAC layering across the stream decorators.

use std::io::{Read, Write};

use shroud_core::{bytes::constant_time_equal, Direction};
use shroud_engine::{
    build_cipher_wrapper, build_mac, AuthenticationFunctionConfiguration, CipherConfiguration,
    CryptoReader, CryptoWriter, MacReader, MacWriter,
};

fn cipher_cfg() -> CipherConfiguration {
    CipherConfiguration::block("Camellia", "CTR", None, 256, &[0x61u8; 16])
}

fn mac_cfg() -> AuthenticationFunctionConfiguration {
    AuthenticationFunctionConfiguration::hmac("SHA512")
}

// The MAC decorates the sink, the cipher sits above it: the tag
// covers ciphertext, and the reading side reproduces it from what it
// actually consumed.
#[test]
fn encrypt_then_mac_round_trip() {
    let cipher_key = [0x10u8; 32];
    let mac_key = b"integrity key";
    let plaintext: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

    let mac_sink = MacWriter::new(Vec::new(), build_mac(&mac_cfg(), mac_key).unwrap());
    let wrapper = build_cipher_wrapper(&cipher_cfg(), &cipher_key, Direction::Encrypt).unwrap();
    let mut writer = CryptoWriter::new(mac_sink, wrapper, Direction::Encrypt);
    for chunk in plaintext.chunks(301) {
        writer.write_all(chunk).unwrap();
    }
    let mut mac_sink = writer.finish().unwrap();
    let sent_tag = mac_sink.finalize_auth().unwrap().to_vec();
    let ciphertext = mac_sink.into_inner();
    assert_eq!(ciphertext.len(), plaintext.len());

    // receive: verify the MAC over ciphertext while decrypting
    let mac_source = MacReader::new(
        ciphertext.as_slice(),
        build_mac(&mac_cfg(), mac_key).unwrap(),
    );
    let wrapper = build_cipher_wrapper(&cipher_cfg(), &cipher_key, Direction::Decrypt).unwrap();
    let mut reader = CryptoReader::new(mac_source, wrapper, Direction::Decrypt);
    let mut recovered = Vec::new();
    reader.read_to_end(&mut recovered).unwrap();
    assert_eq!(recovered, plaintext);

    let mut mac_source = reader.into_inner().unwrap();
    // drain any bytes the reader did not need (none for stream modes)
    let mut rest = Vec::new();
    mac_source.read_to_end(&mut rest).unwrap();
    let received_tag = mac_source.finalize_auth().unwrap();
    assert!(constant_time_equal(&sent_tag, received_tag));
}

#[test]
fn mac_mismatch_is_caught_by_comparison() {
    let mac_key = b"integrity key";
    let mut w = MacWriter::new(Vec::new(), build_mac(&mac_cfg(), mac_key).unwrap());
    w.write_all(b"payload one").unwrap();
    let tag_one = w.finalize_auth().unwrap().to_vec();

    let mut w = MacWriter::new(Vec::new(), build_mac(&mac_cfg(), mac_key).unwrap());
    w.write_all(b"payload two").unwrap();
    let tag_two = w.finalize_auth().unwrap().to_vec();
    assert!(!constant_time_equal(&tag_one, &tag_two));
}
