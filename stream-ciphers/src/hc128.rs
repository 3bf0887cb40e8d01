//! HC-128 (Wu). 128-bit key, 128-bit nonce, 32-bit keystream words.

use shroud_core::{CryptoError, Result, StreamCipher};
use zeroize::Zeroize;

const TABLE_SIZE: usize = 512;
const INIT_WORDS: usize = 1280;

#[inline]
fn f1(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline]
fn f2(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// HC-128 keystream generator.
pub struct Hc128 {
    p: [u32; TABLE_SIZE],
    q: [u32; TABLE_SIZE],
    counter: usize,
    word: [u8; 4],
    offset: usize,
    key: [u8; 16],
    iv: [u8; 16],
}

impl Hc128 {
    /// Key and nonce are both exactly 16 bytes.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() != 16 {
            return Err(CryptoError::InvalidKeySize);
        }
        if iv.len() != 16 {
            return Err(CryptoError::InvalidIvSize);
        }
        let mut hc = Hc128 {
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

    /// Key/IV setup: W expansion, table split, then 1024 cipher steps
    /// whose outputs replace the freshly updated entries.
    fn init(&mut self) {
        let mut w = [0u32; INIT_WORDS];
        for i in 0..4 {
            let k = u32::from_le_bytes(self.key[4 * i..4 * i + 4].try_into().unwrap());
            let v = u32::from_le_bytes(self.iv[4 * i..4 * i + 4].try_into().unwrap());
            w[i] = k;
            w[i + 4] = k;
            w[i + 8] = v;
            w[i + 12] = v;
        }
        for i in 16..INIT_WORDS {
            w[i] = f2(w[i - 2])
                .wrapping_add(w[i - 7])
                .wrapping_add(f1(w[i - 15]))
                .wrapping_add(w[i - 16])
                .wrapping_add(i as u32);
        }
        self.p.copy_from_slice(&w[256..768]);
        self.q.copy_from_slice(&w[768..1280]);
        w.zeroize();
        self.counter = 0;
        self.offset = 4;
        for _ in 0..1024 {
            let i = self.counter;
            let j = i & 0x1ff;
            let s = self.step();
            if i < 512 {
                self.p[j] = s;
            } else {
                self.q[j] = s;
            }
        }
        self.counter = 0;
    }

    #[inline]
    fn g1(x: u32, y: u32, z: u32) -> u32 {
        (x.rotate_right(10) ^ z.rotate_right(23)).wrapping_add(y.rotate_right(8))
    }

    #[inline]
    fn g2(x: u32, y: u32, z: u32) -> u32 {
        (x.rotate_left(10) ^ z.rotate_left(23)).wrapping_add(y.rotate_left(8))
    }

    #[inline]
    fn h1(&self, x: u32) -> u32 {
        self.q[(x & 0xff) as usize].wrapping_add(self.q[(256 + ((x >> 16) & 0xff)) as usize])
    }

    #[inline]
    fn h2(&self, x: u32) -> u32 {
        self.p[(x & 0xff) as usize].wrapping_add(self.p[(256 + ((x >> 16) & 0xff)) as usize])
    }

    /// One cipher step: update a table entry, output one word.
    fn step(&mut self) -> u32 {
        let i = self.counter;
        let j = i & 0x1ff;
        let s = if i < 512 {
            self.p[j] = self.p[j].wrapping_add(Self::g1(
                self.p[(j.wrapping_sub(3)) & 0x1ff],
                self.p[(j.wrapping_sub(10)) & 0x1ff],
                self.p[(j.wrapping_sub(511)) & 0x1ff],
            ));
            self.h1(self.p[(j.wrapping_sub(12)) & 0x1ff]) ^ self.p[j]
        } else {
            self.q[j] = self.q[j].wrapping_add(Self::g2(
                self.q[(j.wrapping_sub(3)) & 0x1ff],
                self.q[(j.wrapping_sub(10)) & 0x1ff],
                self.q[(j.wrapping_sub(511)) & 0x1ff],
            ));
            self.h2(self.q[(j.wrapping_sub(12)) & 0x1ff]) ^ self.q[j]
        };
        self.counter = (self.counter + 1) & 0x3ff;
        s
    }
}

impl StreamCipher for Hc128 {
    fn name(&self) -> &'static str {
        "HC128"
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

impl Drop for Hc128 {
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
    use shroud_core::StreamCipher;

    #[test]
    fn zero_key_zero_iv_first_word() {
        // First keystream word from the HC-128 paper
        let mut hc = Hc128::new(&[0; 16], &[0; 16]).unwrap();
        let mut buf = [0u8; 4];
        hc.apply_keystream(&mut buf);
        assert_eq!(u32::from_le_bytes(buf), 0x7315_0082);
    }

    #[test]
    fn chunked_equals_one_shot() {
        let key = [7u8; 16];
        let iv = [3u8; 16];
        let mut a = Hc128::new(&key, &iv).unwrap();
        let mut one = [0u8; 100];
        a.apply_keystream(&mut one);
        let mut b = Hc128::new(&key, &iv).unwrap();
        let mut chunked = [0u8; 100];
        for chunk in chunked.chunks_mut(7) {
            b.apply_keystream(chunk);
        }
        assert_eq!(one, chunked);
    }

    #[test]
    fn reset_restores_keystream() {
        let mut hc = Hc128::new(&[1; 16], &[2; 16]).unwrap();
        let mut first = [0u8; 32];
        hc.apply_keystream(&mut first);
        hc.reset();
        let mut again = [0u8; 32];
        hc.apply_keystream(&mut again);
        assert_eq!(first, again);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(Hc128::new(&[0; 15], &[0; 16]).is_err());
        assert!(Hc128::new(&[0; 16], &[0; 8]).is_err());
    }
}
