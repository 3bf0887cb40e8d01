//! HC-256 (Wu). 256-bit key, 256-bit nonce, 32-bit keystream words.

use shroud_core::{CryptoError, Result, StreamCipher};
use zeroize::Zeroize;

const TABLE_SIZE: usize = 1024;
const INIT_WORDS: usize = 2560;

#[inline]
fn f1(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline]
fn f2(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// HC-256 keystream generator.
pub struct Hc256 {
    p: [u32; TABLE_SIZE],
    q: [u32; TABLE_SIZE],
    counter: usize,
    word: [u8; 4],
    offset: usize,
    key: [u8; 32],
    iv: [u8; 32],
}

impl Hc256 {
    /// Key and nonce are both exactly 32 bytes.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(CryptoError::InvalidKeySize);
        }
        if iv.len() != 32 {
            return Err(CryptoError::InvalidIvSize);
        }
        let mut hc = Hc256 {
            p: [0; TABLE_SIZE],
            q: [0; TABLE_SIZE],
            counter: 0,
            word: [0; 4],
            offset: 4,
            key: key.try_into().unwrap(),
            iv: iv.try_into().unwrap(),
        };
        hc.init();
        Ok(hc)
    }

    fn init(&mut self) {
        let mut w = vec![0u32; INIT_WORDS];
        for i in 0..8 {
            w[i] = u32::from_le_bytes(self.key[4 * i..4 * i + 4].try_into().unwrap());
            w[i + 8] = u32::from_le_bytes(self.iv[4 * i..4 * i + 4].try_into().unwrap());
        }
        for i in 16..INIT_WORDS {
            w[i] = f2(w[i - 2])
                .wrapping_add(w[i - 7])
                .wrapping_add(f1(w[i - 15]))
                .wrapping_add(w[i - 16])
                .wrapping_add(i as u32);
        }
        self.p.copy_from_slice(&w[512..1536]);
        self.q.copy_from_slice(&w[1536..2560]);
        w.zeroize();
        self.counter = 0;
        self.offset = 4;
        // run 4096 steps without producing output
        for _ in 0..4096 {
            self.step();
        }
        self.counter = 0;
    }

    /// One cipher step over whichever table is active this half.
    fn step(&mut self) -> u32 {
        let i = self.counter;
        let j = i & 0x3ff;
        let s = if i < 1024 {
            step_table(&mut self.p, &self.q, j)
        } else {
            step_table(&mut self.q, &self.p, j)
        };
        self.counter = (self.counter + 1) & 0x7ff;
        s
    }
}

/// Update slot `j` of the active table and emit one keystream word.
fn step_table(active: &mut [u32; TABLE_SIZE], other: &[u32; TABLE_SIZE], j: usize) -> u32 {
    let x = active[(j.wrapping_sub(3)) & 0x3ff];
    let y = active[(j.wrapping_sub(1023)) & 0x3ff];
    let g = (x.rotate_right(10) ^ y.rotate_right(23)).wrapping_add(other[((x ^ y) & 0x3ff) as usize]);
    active[j] = active[j]
        .wrapping_add(active[(j.wrapping_sub(10)) & 0x3ff])
        .wrapping_add(g);
    let z = active[(j.wrapping_sub(12)) & 0x3ff];
    let h = other[(z & 0xff) as usize]
        .wrapping_add(other[(256 + ((z >> 8) & 0xff)) as usize])
        .wrapping_add(other[(512 + ((z >> 16) & 0xff)) as usize])
        .wrapping_add(other[(768 + ((z >> 24) & 0xff)) as usize]);
    h ^ active[j]
}

impl StreamCipher for Hc256 {
    fn name(&self) -> &'static str {
        "HC256"
    }

    fn stride(&self) -> usize {
        4
    }

    fn apply_keystream(&mut self, data: &mut [u8]) {
        for b in data.iter_mut() {
            if self.offset == 4 {
                self.word = self.step().to_le_bytes();
                self.offset = 0;
            }
            *b ^= self.word[self.offset];
            self.offset += 1;
        }
    }

    fn reset(&mut self) {
        self.init();
    }
}

impl Drop for Hc256 {
    fn drop(&mut self) {
        self.p.zeroize();
        self.q.zeroize();
        self.word.zeroize();
        self.key.zeroize();
        self.iv.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keystream vectors from the HC-256 paper.
    #[test]
    fn paper_key0_iv0() {
        let mut hc = Hc256::new(&[0; 32], &[0; 32]).unwrap();
        let mut buf = [0u8; 16];
        hc.apply_keystream(&mut buf);
        assert_eq!(
            buf,
            [
                0x5b, 0x07, 0x89, 0x85, 0xd8, 0xf6, 0xf3, 0x0d, 0x42, 0xc5, 0xc0, 0x2f, 0xa6,
                0xb6, 0x79, 0x51
            ]
        );
    }

    #[test]
    fn paper_key0_iv1() {
        let mut iv = [0u8; 32];
        iv[0] = 1;
        let mut hc = Hc256::new(&[0; 32], &iv).unwrap();
        let mut buf = [0u8; 8];
        hc.apply_keystream(&mut buf);
        assert_eq!(buf, [0xaf, 0xe2, 0xa2, 0xbf, 0x4f, 0x17, 0xce, 0xe9]);
    }

    #[test]
    fn paper_key1_iv0() {
        let mut key = [0u8; 32];
        key[0] = 0x55;
        let mut hc = Hc256::new(&key, &[0; 32]).unwrap();
        let mut buf = [0u8; 8];
        hc.apply_keystream(&mut buf);
        assert_eq!(buf, [0x1c, 0x40, 0x4a, 0xfe, 0x4f, 0xe2, 0x5f, 0xed]);
    }

    #[test]
    fn reset_restores_keystream() {
        let mut hc = Hc256::new(&[9; 32], &[4; 32]).unwrap();
        let mut a = [0u8; 40];
        hc.apply_keystream(&mut a);
        hc.reset();
        let mut b = [0u8; 40];
        hc.apply_keystream(&mut b);
        assert_eq!(a, b);
    }
}
