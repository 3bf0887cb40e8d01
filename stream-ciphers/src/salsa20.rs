//! Salsa20/20 (Bernstein). 128/256-bit key, 64-bit nonce, 64-byte
//! blocks with a 64-bit little-endian block counter.

use shroud_core::{CryptoError, Result, StreamCipher};
use zeroize::Zeroize;

const STATE_WORDS: usize = 16;
const BLOCK: usize = 64;

/// "expand 32-byte k"
const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];
/// "expand 16-byte k"
const TAU: [u32; 4] = [0x6170_7865, 0x3120_646e, 0x7962_2d36, 0x6b20_6574];

/// Salsa20 keystream generator.
pub struct Salsa20 {
    state: [u32; STATE_WORDS],
    block: [u8; BLOCK],
    offset: usize,
}

impl Salsa20 {
    /// 16 or 32-byte key, 8-byte nonce.
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self> {
        let constants = match key.len() {
            16 => &TAU,
            32 => &SIGMA,
            _ => return Err(CryptoError::InvalidKeySize),
        };
        if nonce.len() != 8 {
            return Err(CryptoError::InvalidIvSize);
        }
        let (k1, k2) = if key.len() == 32 {
            (&key[..16], &key[16..])
        } else {
            (key, key)
        };
        let mut state = [0u32; STATE_WORDS];
        state[0] = constants[0];
        for (i, chunk) in k1.chunks_exact(4).enumerate() {
            state[1 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        state[5] = constants[1];
        for (i, chunk) in nonce.chunks_exact(4).enumerate() {
            state[6 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        state[8] = 0;
        state[9] = 0;
        state[10] = constants[2];
        for (i, chunk) in k2.chunks_exact(4).enumerate() {
            state[11 + i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        state[15] = constants[3];
        Ok(Salsa20 {
            state,
            block: [0; BLOCK],
            offset: BLOCK,
        })
    }

    /// The core function: 20 rounds of quarter-rounds, then the
    /// feed-forward addition.
    fn generate_block(&mut self) {
        let mut x = self.state;
        for _ in 0..10 {
            quarter(&mut x, 0, 4, 8, 12);
            quarter(&mut x, 5, 9, 13, 1);
            quarter(&mut x, 10, 14, 2, 6);
            quarter(&mut x, 15, 3, 7, 11);
            quarter(&mut x, 0, 1, 2, 3);
            quarter(&mut x, 5, 6, 7, 4);
            quarter(&mut x, 10, 11, 8, 9);
            quarter(&mut x, 15, 12, 13, 14);
        }
        for (i, w) in x.iter_mut().enumerate() {
            *w = w.wrapping_add(self.state[i]);
            self.block[4 * i..4 * i + 4].copy_from_slice(&w.to_le_bytes());
        }
        // 64-bit block counter in words 8, 9
        let counter = (u64::from(self.state[9]) << 32 | u64::from(self.state[8])).wrapping_add(1);
        self.state[8] = counter as u32;
        self.state[9] = (counter >> 32) as u32;
    }
}

#[inline]
fn quarter(x: &mut [u32; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

impl StreamCipher for Salsa20 {
    fn name(&self) -> &'static str {
        "Salsa20"
    }

    fn stride(&self) -> usize {
        BLOCK
    }

    fn apply_keystream(&mut self, data: &mut [u8]) {
        for b in data.iter_mut() {
            if self.offset == BLOCK {
                self.generate_block();
                self.offset = 0;
            }
            *b ^= self.block[self.offset];
            self.offset += 1;
        }
    }

    fn reset(&mut self) {
        self.state[8] = 0;
        self.state[9] = 0;
        self.offset = BLOCK;
        self.block.zeroize();
    }
}

impl Drop for Salsa20 {
    fn drop(&mut self) {
        self.state.zeroize();
        self.block.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // eSTREAM 256-bit set 1 vector 0.
    #[test]
    fn estream_set1_vector0() {
        let key = hex!("8000000000000000000000000000000000000000000000000000000000000000");
        let mut c = Salsa20::new(&key, &[0; 8]).unwrap();
        let mut buf = [0u8; 64];
        c.apply_keystream(&mut buf);
        assert_eq!(&buf[..8], &hex!("e3be8fdd8beca2e3"));
    }

    #[test]
    fn counter_spans_blocks() {
        let key = [0x42u8; 32];
        let mut a = Salsa20::new(&key, &[0x24; 8]).unwrap();
        let mut one = vec![0u8; 200];
        a.apply_keystream(&mut one);
        let mut b = Salsa20::new(&key, &[0x24; 8]).unwrap();
        let mut chunked = vec![0u8; 200];
        for c in chunked.chunks_mut(33) {
            b.apply_keystream(c);
        }
        assert_eq!(one, chunked);
    }

    #[test]
    fn reset_rewinds_counter() {
        let mut c = Salsa20::new(&[1u8; 32], &[2; 8]).unwrap();
        let mut a = [0u8; 100];
        c.apply_keystream(&mut a);
        c.reset();
        let mut b = [0u8; 100];
        c.apply_keystream(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn short_key_form() {
        let mut c = Salsa20::new(&[7u8; 16], &[0; 8]).unwrap();
        let mut buf = [0u8; 16];
        c.apply_keystream(&mut buf);
        assert_ne!(buf, [0u8; 16]);
    }
}
