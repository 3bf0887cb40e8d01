//! EAX mode (Bellare, Rogaway, Wagner): CTR encryption bound by three
//! tweaked OMACs over nonce, header and ciphertext. The tag may be
//! truncated to 64..128 bits. Nonce reuse is not allowed.
//!
//! As with GCM, decryption buffers ciphertext and verifies the tag
//! before releasing plaintext.

use shroud_core::{
    bytes::constant_time_equal, BlockCipher, CipherWrapper, CryptoError, Direction, Result,
};
use zeroize::Zeroize;

const BS: usize = 16;

/// Doubling in GF(2^128), constant-time mask selection.
fn dbl(block: &mut [u8; BS]) {
    let mask = (block[0] >> 7).wrapping_neg();
    let mut carry = 0u8;
    for b in block.iter_mut().rev() {
        let nc = *b >> 7;
        *b = (*b << 1) | carry;
        carry = nc;
    }
    block[BS - 1] ^= 0x87 & mask;
}

/// Incremental OMAC over a borrowed cipher.
struct Omac {
    k1: [u8; BS],
    k2: [u8; BS],
    state: [u8; BS],
    buffer: [u8; BS],
    filled: usize,
}

impl Omac {
    fn new<C: BlockCipher>(cipher: &C) -> Result<Self> {
        let mut l = [0u8; BS];
        cipher.encrypt_block(&mut l)?;
        let mut k1 = l;
        dbl(&mut k1);
        let mut k2 = k1;
        dbl(&mut k2);
        l.zeroize();
        Ok(Omac {
            k1,
            k2,
            state: [0; BS],
            buffer: [0; BS],
            filled: 0,
        })
    }

    /// The tweak is a full zero block ending in the domain byte.
    fn tweaked<C: BlockCipher>(cipher: &C, tweak: u8) -> Result<Self> {
        let mut m = Self::new(cipher)?;
        let mut block = [0u8; BS];
        block[BS - 1] = tweak;
        m.update(cipher, &block)?;
        Ok(m)
    }

    fn update<C: BlockCipher>(&mut self, cipher: &C, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            if self.filled == BS {
                for i in 0..BS {
                    self.state[i] ^= self.buffer[i];
                }
                cipher.encrypt_block(&mut self.state)?;
                self.filled = 0;
            }
            let take = (BS - self.filled).min(data.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
        }
        Ok(())
    }

    fn finalize<C: BlockCipher>(&mut self, cipher: &C) -> Result<[u8; BS]> {
        let subkey = if self.filled == BS {
            self.k1
        } else {
            self.buffer[self.filled] = 0x80;
            for b in &mut self.buffer[self.filled + 1..] {
                *b = 0;
            }
            self.k2
        };
        for i in 0..BS {
            self.state[i] ^= self.buffer[i] ^ subkey[i];
        }
        cipher.encrypt_block(&mut self.state)?;
        Ok(self.state)
    }
}

impl Drop for Omac {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.state.zeroize();
        self.buffer.zeroize();
    }
}

/// EAX transform; one instance per direction and nonce.
pub struct Eax<C: BlockCipher> {
    cipher: C,
    nonce_mac: [u8; BS],
    header_mac: [u8; BS],
    text_mac: Omac,
    counter: [u8; BS],
    mac_size: usize,
    direction: Direction,
    pending: Vec<u8>,
    finished: bool,
}

impl<C: BlockCipher> Eax<C> {
    /// Wraps a 128-bit block cipher with any-length nonce and header;
    /// `mac_size_bits` is 64..=128 in byte steps.
    pub fn new(
        cipher: C,
        nonce: &[u8],
        mac_size_bits: u32,
        aad: &[u8],
        direction: Direction,
    ) -> Result<Self> {
        if cipher.block_size() != BS {
            return Err(CryptoError::InvalidBlockSize);
        }
        if !(64..=128).contains(&mac_size_bits) || mac_size_bits % 8 != 0 {
            return Err(CryptoError::InvalidMacSize);
        }
        let mut n = Omac::tweaked(&cipher, 0)?;
        n.update(&cipher, nonce)?;
        let nonce_mac = n.finalize(&cipher)?;
        let mut h = Omac::tweaked(&cipher, 1)?;
        h.update(&cipher, aad)?;
        let header_mac = h.finalize(&cipher)?;
        let text_mac = Omac::tweaked(&cipher, 2)?;
        Ok(Eax {
            counter: nonce_mac,
            nonce_mac,
            header_mac,
            text_mac,
            cipher,
            mac_size: (mac_size_bits / 8) as usize,
            direction,
            pending: Vec::new(),
            finished: false,
        })
    }

    /// Full-block big-endian increment, as CTR over the OMAC'd nonce.
    fn keystream(&mut self, out: &mut [u8; BS]) -> Result<()> {
        out.copy_from_slice(&self.counter);
        self.cipher.encrypt_block(out)?;
        for i in (0..BS).rev() {
            self.counter[i] = self.counter[i].wrapping_add(1);
            if self.counter[i] != 0 {
                break;
            }
        }
        Ok(())
    }

    fn final_tag(&mut self, ct_mac: [u8; BS]) -> [u8; BS] {
        let mut tag = [0u8; BS];
        for i in 0..BS {
            tag[i] = self.nonce_mac[i] ^ self.header_mac[i] ^ ct_mac[i];
        }
        tag
    }
}

impl<C: BlockCipher> CipherWrapper for Eax<C> {
    fn name(&self) -> &'static str {
        "EAX"
    }

    fn operation_size(&self) -> usize {
        BS
    }

    fn is_partial_block_ok(&self) -> bool {
        true
    }

    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        if input.len() < BS {
            return Err(CryptoError::ShortBuffer);
        }
        match self.direction {
            Direction::Encrypt => {
                if output.len() < BS {
                    return Err(CryptoError::ShortBuffer);
                }
                let mut ks = [0u8; BS];
                self.keystream(&mut ks)?;
                for i in 0..BS {
                    output[i] = input[i] ^ ks[i];
                }
                ks.zeroize();
                self.text_mac.update(&self.cipher, &output[..BS])?;
                Ok(BS)
            }
            Direction::Decrypt => {
                self.pending.extend_from_slice(&input[..BS]);
                Ok(0)
            }
        }
    }

    fn process_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        self.finished = true;
        match self.direction {
            Direction::Encrypt => {
                if output.len() < input.len() + self.mac_size {
                    return Err(CryptoError::ShortBuffer);
                }
                if !input.is_empty() {
                    let mut ks = [0u8; BS];
                    self.keystream(&mut ks)?;
                    for i in 0..input.len() {
                        output[i] = input[i] ^ ks[i];
                    }
                    ks.zeroize();
                    self.text_mac.update(&self.cipher, &output[..input.len()])?;
                }
                let ct_mac = self.text_mac.finalize(&self.cipher)?;
                let tag = self.final_tag(ct_mac);
                output[input.len()..input.len() + self.mac_size]
                    .copy_from_slice(&tag[..self.mac_size]);
                Ok(input.len() + self.mac_size)
            }
            Direction::Decrypt => {
                self.pending.extend_from_slice(input);
                if self.pending.len() < self.mac_size {
                    self.pending.zeroize();
                    return Err(CryptoError::CiphertextAuthentication);
                }
                let text_len = self.pending.len() - self.mac_size;
                if output.len() < text_len {
                    return Err(CryptoError::ShortBuffer);
                }
                let mut pending = core::mem::take(&mut self.pending);
                let (ct, tag) = pending.split_at(text_len);
                self.text_mac.update(&self.cipher, ct)?;
                let ct_mac = self.text_mac.finalize(&self.cipher)?;
                let expected = self.final_tag(ct_mac);
                if !constant_time_equal(&expected[..self.mac_size], tag) {
                    pending.zeroize();
                    return Err(CryptoError::CiphertextAuthentication);
                }
                for (i, chunk) in ct.chunks(BS).enumerate() {
                    let mut ks = [0u8; BS];
                    self.keystream(&mut ks)?;
                    for (j, &c) in chunk.iter().enumerate() {
                        output[BS * i + j] = c ^ ks[j];
                    }
                    ks.zeroize();
                }
                pending.zeroize();
                Ok(text_len)
            }
        }
    }

    fn reset(&mut self) {
        // a fresh transform per message; nonce reuse is NotAllowed
        self.counter = self.nonce_mac;
        self.pending.zeroize();
        self.pending.clear();
        self.finished = false;
    }
}

impl<C: BlockCipher> Drop for Eax<C> {
    fn drop(&mut self) {
        self.nonce_mac.zeroize();
        self.header_mac.zeroize();
        self.counter.zeroize();
        self.pending.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::Aes;

    fn one_shot(
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        pt: &[u8],
        mac_bits: u32,
    ) -> Vec<u8> {
        let mut eax = Eax::new(
            Aes::new(key).unwrap(),
            nonce,
            mac_bits,
            aad,
            Direction::Encrypt,
        )
        .unwrap();
        let mut out = vec![0u8; pt.len() + 16];
        let mut written = 0;
        let mut consumed = 0;
        while pt.len() - consumed >= 16 {
            written += eax
                .process_bytes(&pt[consumed..consumed + 16], &mut out[written..])
                .unwrap();
            consumed += 16;
        }
        written += eax
            .process_final(&pt[consumed..], &mut out[written..])
            .unwrap();
        out.truncate(written);
        out
    }

    // EAX paper test vector 1: empty message.
    #[test]
    fn paper_vector_empty() {
        let out = one_shot(
            &hex!("233952dee4d5ed5f9b9c6d6ff80ff478"),
            &hex!("62ec67f9c3a4a407fcb2a8c49031a8b3"),
            &hex!("6bfb914fd07eae6b"),
            b"",
            128,
        );
        assert_eq!(out, hex!("e037830e8389f27b025a2d6527e79d01"));
    }

    // EAX paper test vector 3: five message bytes.
    #[test]
    fn paper_vector_short_message() {
        let out = one_shot(
            &hex!("01f74ad64077f2e704c0f60ada3dd523"),
            &hex!("70c3db4f0d26368400a10ed05d2bff5e"),
            &hex!("234a3463c1264ac6"),
            &hex!("1a47cb4933"),
            128,
        );
        assert_eq!(
            out,
            hex!("d851d5bae03a59f238a23e39199dc9266626c40f80")
        );
    }

    #[test]
    fn truncated_tag_and_round_trip() {
        let key = hex!("000102030405060708090a0b0c0d0e0f");
        let nonce = hex!("00112233445566778899aabb");
        let pt: Vec<u8> = (0..40).collect();
        let ct = one_shot(&key, &nonce, b"header", &pt, 128);
        assert_eq!(
            ct,
            hex!(
                "6ffbaf4f83f6a0994862296727dd3312f6bdb6ca6b69189d269781d13384470c"
                "a726c4fbadf2e314c068acdd40ed2a10f0f0a339706f6f96"
            )
        );
        let ct8 = one_shot(&key, &nonce, b"header", &pt, 64);
        assert_eq!(&ct8[40..], &hex!("c068acdd40ed2a10"));

        let mut dec = Eax::new(
            Aes::new(&key).unwrap(),
            &nonce,
            128,
            b"header",
            Direction::Decrypt,
        )
        .unwrap();
        let mut out = vec![0u8; ct.len()];
        let mut written = 0;
        let mut consumed = 0;
        while ct.len() - consumed >= 16 {
            written += dec
                .process_bytes(&ct[consumed..consumed + 16], &mut out[written..])
                .unwrap();
            consumed += 16;
        }
        written += dec
            .process_final(&ct[consumed..], &mut out[written..])
            .unwrap();
        out.truncate(written);
        assert_eq!(out, pt);
    }

    #[test]
    fn tamper_fails_with_no_output() {
        let key = [4u8; 16];
        let nonce = [5u8; 16];
        let pt = b"something secret".to_vec();
        let mut ct = one_shot(&key, &nonce, b"", &pt, 128);
        ct[0] ^= 0x80;
        let mut dec =
            Eax::new(Aes::new(&key).unwrap(), &nonce, 128, b"", Direction::Decrypt).unwrap();
        let mut out = vec![0u8; ct.len()];
        let mut written = 0;
        let mut consumed = 0;
        while ct.len() - consumed >= 16 {
            written += dec
                .process_bytes(&ct[consumed..consumed + 16], &mut out[written..])
                .unwrap();
            consumed += 16;
        }
        assert_eq!(written, 0);
        assert_eq!(
            dec.process_final(&ct[consumed..], &mut out).unwrap_err(),
            CryptoError::CiphertextAuthentication
        );
    }
}
