//! Galois/Counter Mode (NIST SP 800-38D) over a 128-bit block cipher.
//!
//! Streaming encryption emits ciphertext block by block and appends
//! the tag at finalization. Decryption buffers the whole ciphertext
//! and verifies the tag before a single plaintext byte leaves the
//! transform.

use shroud_core::{
    bytes::constant_time_equal, BlockCipher, CipherWrapper, CryptoError, Direction, Result,
};
use zeroize::Zeroize;

const BS: usize = 16;

/// Bit-reflected multiply in GF(2^128) mod x^128 + x^7 + x^2 + x + 1.
fn gf_mul(x: u128, y: u128) -> u128 {
    const R: u128 = 0xe1 << 120;
    let mut z = 0u128;
    let mut v = y;
    for i in (0..128).rev() {
        if (x >> i) & 1 != 0 {
            z ^= v;
        }
        v = if v & 1 != 0 { (v >> 1) ^ R } else { v >> 1 };
    }
    z
}

struct Ghash {
    h: u128,
    y: u128,
}

impl Ghash {
    fn new(h: u128) -> Self {
        Ghash { h, y: 0 }
    }

    fn block(&mut self, block: &[u8]) {
        let mut padded = [0u8; BS];
        padded[..block.len()].copy_from_slice(block);
        self.y = gf_mul(self.y ^ u128::from_be_bytes(padded), self.h);
    }

    fn over(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let n = data.len().min(BS);
            self.block(&data[..n]);
            data = &data[n..];
        }
    }
}

/// GCM transform; one instance per direction and nonce.
pub struct Gcm<C: BlockCipher> {
    cipher: C,
    h: u128,
    j0: u128,
    counter: u128,
    ghash: Ghash,
    aad_bits: u64,
    text_bits: u64,
    mac_size: usize,
    direction: Direction,
    pending: Vec<u8>,
    finished: bool,
}

impl<C: BlockCipher> Gcm<C> {
    /// Wraps a 128-bit block cipher. The nonce may be any non-empty
    /// length (96 bits recommended); the tag is fixed at 128 bits per
    /// the registry.
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
        if nonce.is_empty() {
            return Err(CryptoError::InvalidIvSize);
        }
        if mac_size_bits != 128 {
            return Err(CryptoError::InvalidMacSize);
        }
        let mut hb = [0u8; BS];
        cipher.encrypt_block(&mut hb)?;
        let h = u128::from_be_bytes(hb);
        hb.zeroize();

        let j0 = if nonce.len() == 12 {
            let mut block = [0u8; BS];
            block[..12].copy_from_slice(nonce);
            block[15] = 1;
            u128::from_be_bytes(block)
        } else {
            let mut g = Ghash::new(h);
            g.over(nonce);
            let mut lens = [0u8; BS];
            lens[8..].copy_from_slice(&((nonce.len() as u64) * 8).to_be_bytes());
            g.block(&lens);
            g.y
        };

        let mut ghash = Ghash::new(h);
        ghash.over(aad);
        // aad is padded to a block boundary before ciphertext enters
        Ok(Gcm {
            cipher,
            h,
            j0,
            counter: j0,
            ghash,
            aad_bits: (aad.len() as u64) * 8,
            text_bits: 0,
            mac_size: (mac_size_bits / 8) as usize,
            direction,
            pending: Vec::new(),
            finished: false,
        })
    }

    /// 32-bit wrapping increment of the counter word.
    fn next_counter(&mut self) -> u128 {
        let inc = (self.counter & !0xffff_ffffu128)
            | ((self.counter as u32).wrapping_add(1) as u128);
        self.counter = inc;
        inc
    }

    fn keystream(&mut self, out: &mut [u8; BS]) -> Result<()> {
        let c = self.next_counter();
        out.copy_from_slice(&c.to_be_bytes());
        self.cipher.encrypt_block(out)
    }

    fn compute_tag(&mut self) -> Result<[u8; BS]> {
        let mut lens = [0u8; BS];
        lens[..8].copy_from_slice(&self.aad_bits.to_be_bytes());
        lens[8..].copy_from_slice(&self.text_bits.to_be_bytes());
        self.ghash.block(&lens);
        let mut tag = self.j0.to_be_bytes();
        self.cipher.encrypt_block(&mut tag)?;
        let s = self.ghash.y.to_be_bytes();
        for i in 0..BS {
            tag[i] ^= s[i];
        }
        Ok(tag)
    }

    fn encrypt_chunk(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let mut ks = [0u8; BS];
        self.keystream(&mut ks)?;
        for i in 0..input.len() {
            output[i] = input[i] ^ ks[i];
        }
        ks.zeroize();
        self.ghash.block(&output[..input.len()]);
        self.text_bits += (input.len() as u64) * 8;
        Ok(input.len())
    }
}

impl<C: BlockCipher> CipherWrapper for Gcm<C> {
    fn name(&self) -> &'static str {
        "GCM"
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
                self.encrypt_chunk(&input[..BS], output)
            }
            Direction::Decrypt => {
                // withheld until the tag verifies
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
                let mut written = 0;
                if !input.is_empty() {
                    written = self.encrypt_chunk(input, output)?;
                }
                let tag = self.compute_tag()?;
                output[written..written + self.mac_size]
                    .copy_from_slice(&tag[..self.mac_size]);
                Ok(written + self.mac_size)
            }
            Direction::Decrypt => {
                self.pending.extend_from_slice(input);
                if self.pending.len() < self.mac_size {
                    self.zeroize_state();
                    return Err(CryptoError::CiphertextAuthentication);
                }
                let text_len = self.pending.len() - self.mac_size;
                if output.len() < text_len {
                    return Err(CryptoError::ShortBuffer);
                }
                let mut pending = core::mem::take(&mut self.pending);
                let (ct, tag) = pending.split_at(text_len);
                self.ghash.over(ct);
                self.text_bits = (text_len as u64) * 8;
                let expected = self.compute_tag()?;
                if !constant_time_equal(&expected[..self.mac_size], tag) {
                    self.zeroize_state();
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
        self.counter = self.j0;
        self.ghash = Ghash::new(self.h);
        self.text_bits = 0;
        self.pending.zeroize();
        self.pending.clear();
        self.finished = false;
        // the aad contribution must be replayed by the owner; the
        // engine constructs a fresh transform per message instead
    }
}

impl<C: BlockCipher> Gcm<C> {
    fn zeroize_state(&mut self) {
        self.pending.zeroize();
        self.pending.clear();
        self.h = 0;
        self.j0 = 0;
        self.counter = 0;
        self.ghash.y = 0;
        self.ghash.h = 0;
    }
}

impl<C: BlockCipher> Drop for Gcm<C> {
    fn drop(&mut self) {
        self.zeroize_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::Aes;

    fn encrypt_all(key: &[u8], nonce: &[u8], aad: &[u8], pt: &[u8]) -> Vec<u8> {
        let mut gcm = Gcm::new(
            Aes::new(key).unwrap(),
            nonce,
            128,
            aad,
            Direction::Encrypt,
        )
        .unwrap();
        let mut out = vec![0u8; pt.len() + 16];
        let mut written = 0;
        let mut consumed = 0;
        while pt.len() - consumed >= 16 {
            written += gcm
                .process_bytes(&pt[consumed..consumed + 16], &mut out[written..])
                .unwrap();
            consumed += 16;
        }
        written += gcm
            .process_final(&pt[consumed..], &mut out[written..])
            .unwrap();
        out.truncate(written);
        out
    }

    fn decrypt_all(key: &[u8], nonce: &[u8], aad: &[u8], ct: &[u8]) -> Result<Vec<u8>> {
        let mut gcm = Gcm::new(
            Aes::new(key).unwrap(),
            nonce,
            128,
            aad,
            Direction::Decrypt,
        )
        .unwrap();
        let mut out = vec![0u8; ct.len()];
        let mut consumed = 0;
        let mut written = 0;
        while ct.len() - consumed >= 16 {
            written += gcm.process_bytes(&ct[consumed..consumed + 16], &mut out[written..])?;
            consumed += 16;
        }
        written += gcm.process_final(&ct[consumed..], &mut out[written..])?;
        out.truncate(written);
        Ok(out)
    }

    // NIST GCM test case 1: empty everything.
    #[test]
    fn nist_case_1() {
        let out = encrypt_all(&[0u8; 16], &[0u8; 12], b"", b"");
        assert_eq!(out, hex!("58e2fccefa7e3061367f1d57a4e7455a"));
    }

    // NIST GCM test case 2: one zero block.
    #[test]
    fn nist_case_2() {
        let out = encrypt_all(&[0u8; 16], &[0u8; 12], b"", &[0u8; 16]);
        assert_eq!(
            out,
            hex!("0388dace60b6a392f328c2b971b2fe78ab6e47d42cec13bdf53a67b21257bddf")
        );
    }

    #[test]
    fn round_trip_with_aad_and_partial_tail() {
        let key = [7u8; 32];
        let nonce = hex!("cafebabefacedbaddecaf888");
        let aad = b"header bytes";
        let pt: Vec<u8> = (0..45).collect();
        let ct = encrypt_all(&key, &nonce, aad, &pt);
        assert_eq!(ct.len(), pt.len() + 16);
        assert_eq!(decrypt_all(&key, &nonce, aad, &ct).unwrap(), pt);
    }

    #[test]
    fn tamper_detection_yields_no_plaintext() {
        let key = [1u8; 16];
        let nonce = [2u8; 12];
        let pt = b"attack at dawn--hold position--".to_vec();
        let mut ct = encrypt_all(&key, &nonce, b"", &pt);
        ct[3] ^= 0x01;
        assert_eq!(
            decrypt_all(&key, &nonce, b"", &ct).unwrap_err(),
            CryptoError::CiphertextAuthentication
        );
        // aad flip too
        let ct = encrypt_all(&key, &nonce, b"aad", &pt);
        assert!(decrypt_all(&key, &nonce, b"aaD", &ct).is_err());
    }

    #[test]
    fn non_96_bit_nonce_uses_ghash_derivation() {
        let key = [3u8; 16];
        let nonce = [9u8; 60];
        let pt = b"sixteen byte msg".to_vec();
        let ct = encrypt_all(&key, &nonce, b"", &pt);
        assert_eq!(decrypt_all(&key, &nonce, b"", &ct).unwrap(), pt);
    }
}
