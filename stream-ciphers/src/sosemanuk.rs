//! SOSEMANUK (Berbain et al.). 128..256-bit key, 128-bit nonce.
//!
//! A 10-word LFSR over GF(2^32) driven alongside a two-register FSM,
//! seeded by a reduced-round Serpent applied to the nonce. Output is
//! produced four words at a time through a bitsliced Serpent S-box.

use shroud_core::{CryptoError, Result, StreamCipher};
use zeroize::Zeroize;

const PHI: u32 = 0x9e37_79b9;
/// The FSM multiplier of the Trans function.
const TRANS_M: u32 = 0x5465_5307;

/// Serpent S-boxes used by the key schedule and the output transform.
const SBOX: [[u8; 16]; 8] = [
    [3, 8, 15, 1, 10, 6, 5, 11, 14, 13, 4, 2, 7, 0, 9, 12],
    [15, 12, 2, 7, 9, 0, 5, 10, 1, 11, 14, 8, 6, 13, 3, 4],
    [8, 6, 7, 9, 3, 12, 10, 15, 13, 1, 14, 4, 0, 11, 5, 2],
    [0, 15, 11, 8, 12, 9, 6, 3, 13, 1, 2, 4, 10, 7, 5, 14],
    [1, 15, 8, 3, 12, 0, 11, 6, 2, 5, 4, 10, 9, 14, 7, 13],
    [15, 5, 2, 11, 4, 10, 9, 12, 0, 3, 14, 8, 13, 6, 7, 1],
    [7, 2, 12, 5, 8, 4, 6, 11, 14, 9, 1, 15, 13, 3, 10, 0],
    [1, 13, 15, 0, 14, 8, 2, 11, 7, 4, 12, 10, 9, 3, 5, 6],
];

/// GF(2^8) multiply modulo x^8 + x^7 + x^5 + x^3 + 1, the beta field
/// of the SOSEMANUK specification.
const fn beta_mul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            p ^= a;
        }
        let hi = a & 0x80;
        a <<= 1;
        if hi != 0 {
            a ^= 0xa9;
        }
        b >>= 1;
        i += 1;
    }
    p
}

const fn beta_pow(e: u32) -> u8 {
    let mut r = 1u8;
    let mut i = 0;
    while i < e {
        r = beta_mul(r, 0x02);
        i += 1;
    }
    r
}

/// Multiplication by alpha: alpha^4 = b^23 a^3 + b^245 a^2 + b^48 a + b^239.
const fn mul_alpha_table() -> [u32; 256] {
    let c3 = beta_pow(23);
    let c2 = beta_pow(245);
    let c1 = beta_pow(48);
    let c0 = beta_pow(239);
    let mut t = [0u32; 256];
    let mut x = 0;
    while x < 256 {
        let b = x as u8;
        t[x] = ((beta_mul(b, c3) as u32) << 24)
            | ((beta_mul(b, c2) as u32) << 16)
            | ((beta_mul(b, c1) as u32) << 8)
            | (beta_mul(b, c0) as u32);
        x += 1;
    }
    t
}

/// Division by alpha: alpha^-1 = b^16 a^3 + b^39 a^2 + b^6 a + b^64.
const fn div_alpha_table() -> [u32; 256] {
    let c3 = beta_pow(16);
    let c2 = beta_pow(39);
    let c1 = beta_pow(6);
    let c0 = beta_pow(64);
    let mut t = [0u32; 256];
    let mut x = 0;
    while x < 256 {
        let b = x as u8;
        t[x] = ((beta_mul(b, c3) as u32) << 24)
            | ((beta_mul(b, c2) as u32) << 16)
            | ((beta_mul(b, c1) as u32) << 8)
            | (beta_mul(b, c0) as u32);
        x += 1;
    }
    t
}

static MUL_A: [u32; 256] = mul_alpha_table();
static DIV_A: [u32; 256] = div_alpha_table();

#[inline]
fn mul_alpha(x: u32) -> u32 {
    (x << 8) ^ MUL_A[(x >> 24) as usize]
}

#[inline]
fn div_alpha(x: u32) -> u32 {
    (x >> 8) ^ DIV_A[(x & 0xff) as usize]
}

fn sbox_bitslice(table: &[u8; 16], x: [u32; 4]) -> [u32; 4] {
    let mut out = [0u32; 4];
    for bit in 0..32 {
        let nib = ((x[0] >> bit) & 1)
            | (((x[1] >> bit) & 1) << 1)
            | (((x[2] >> bit) & 1) << 2)
            | (((x[3] >> bit) & 1) << 3);
        let v = u32::from(table[nib as usize]);
        for (j, word) in out.iter_mut().enumerate() {
            *word |= ((v >> j) & 1) << bit;
        }
    }
    out
}

fn serpent_linear(x: &mut [u32; 4]) {
    x[0] = x[0].rotate_left(13);
    x[2] = x[2].rotate_left(3);
    x[1] ^= x[0] ^ x[2];
    x[3] ^= x[2] ^ (x[0] << 3);
    x[1] = x[1].rotate_left(1);
    x[3] = x[3].rotate_left(7);
    x[0] ^= x[1] ^ x[3];
    x[2] ^= x[3] ^ (x[1] << 7);
    x[0] = x[0].rotate_left(5);
    x[2] = x[2].rotate_left(22);
}

/// Serpent key schedule truncated to the 25 round keys Serpent24 uses.
fn serpent24_round_keys(key: &[u8]) -> [[u32; 4]; 25] {
    let mut padded = [0u8; 32];
    padded[..key.len()].copy_from_slice(key);
    if key.len() < 32 {
        padded[key.len()] = 0x01;
    }
    let mut w = [0u32; 108];
    for i in 0..8 {
        w[i] = u32::from_le_bytes(padded[4 * i..4 * i + 4].try_into().unwrap());
    }
    for i in 0..100 {
        w[i + 8] = (w[i] ^ w[i + 3] ^ w[i + 5] ^ w[i + 7] ^ PHI ^ i as u32).rotate_left(11);
    }
    let mut rk = [[0u32; 4]; 25];
    for (r, keys) in rk.iter_mut().enumerate() {
        let box_idx = (3 + 8 - (r % 8)) % 8;
        let words = [w[8 + 4 * r], w[9 + 4 * r], w[10 + 4 * r], w[11 + 4 * r]];
        *keys = sbox_bitslice(&SBOX[box_idx], words);
    }
    padded.zeroize();
    w.zeroize();
    rk
}

/// SOSEMANUK keystream generator.
pub struct Sosemanuk {
    lfsr: [u32; 10],
    r1: u32,
    r2: u32,
    block: [u8; 16],
    offset: usize,
    key: Vec<u8>,
    iv: [u8; 16],
}

impl Sosemanuk {
    /// Keys run 16..=32 bytes; the nonce is up to 16 bytes and is
    /// zero-padded.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self> {
        if key.len() < 16 || key.len() > 32 {
            return Err(CryptoError::InvalidKeySize);
        }
        if iv.len() > 16 {
            return Err(CryptoError::InvalidIvSize);
        }
        let mut c = Sosemanuk {
            lfsr: [0; 10],
            r1: 0,
            r2: 0,
            block: [0; 16],
            offset: 16,
            key: key.to_vec(),
            iv: {
                let mut padded = [0u8; 16];
                padded[..iv.len()].copy_from_slice(iv);
                padded
            },
        };
        c.init();
        Ok(c)
    }

    /// Run Serpent24 over the nonce; the round-12, 18 and 24 outputs
    /// seed the LFSR and the FSM registers.
    fn init(&mut self) {
        let rk = serpent24_round_keys(&self.key);
        let mut x = [0u32; 4];
        for (i, chunk) in self.iv.chunks_exact(4).enumerate() {
            x[i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        for r in 0..24 {
            for i in 0..4 {
                x[i] ^= rk[r][i];
            }
            x = sbox_bitslice(&SBOX[r % 8], x);
            if r == 11 {
                self.lfsr[9] = x[3];
                self.lfsr[8] = x[2];
                self.lfsr[7] = x[1];
                self.lfsr[6] = x[0];
            }
            if r == 17 {
                self.r1 = x[0];
                self.lfsr[4] = x[1];
                self.r2 = x[2];
                self.lfsr[5] = x[3];
            }
            if r == 23 {
                // final round key applied before capture
                let mut y = x;
                for i in 0..4 {
                    y[i] ^= rk[24][i];
                }
                self.lfsr[3] = y[0];
                self.lfsr[2] = y[1];
                self.lfsr[1] = y[2];
                self.lfsr[0] = y[3];
                break;
            }
            serpent_linear(&mut x);
        }
        self.offset = 16;
        self.block.zeroize();
    }

    /// Four LFSR+FSM steps and the Serpent1 output transform.
    fn generate_block(&mut self) {
        let mut f = [0u32; 4];
        let mut dropped = [0u32; 4];
        for t in 0..4 {
            // FSM update
            let mux = if self.r1 & 1 == 0 {
                self.lfsr[1]
            } else {
                self.lfsr[1] ^ self.lfsr[8]
            };
            let new_r1 = self.r2.wrapping_add(mux);
            self.r2 = self.r1.wrapping_mul(TRANS_M).rotate_left(7);
            self.r1 = new_r1;
            f[t] = self.lfsr[9].wrapping_add(self.r1) ^ self.r2;
            // LFSR step
            let fresh = self.lfsr[9] ^ div_alpha(self.lfsr[3]) ^ mul_alpha(self.lfsr[0]);
            dropped[t] = self.lfsr[0];
            for i in 0..9 {
                self.lfsr[i] = self.lfsr[i + 1];
            }
            self.lfsr[9] = fresh;
        }
        let z = sbox_bitslice(&SBOX[2], f);
        for t in 0..4 {
            let word = z[t] ^ dropped[t];
            self.block[4 * t..4 * t + 4].copy_from_slice(&word.to_le_bytes());
        }
    }
}

impl StreamCipher for Sosemanuk {
    fn name(&self) -> &'static str {
        "SOSEMANUK"
    }

    fn stride(&self) -> usize {
        16
    }

    fn apply_keystream(&mut self, data: &mut [u8]) {
        for b in data.iter_mut() {
            if self.offset == 16 {
                self.generate_block();
                self.offset = 0;
            }
            *b ^= self.block[self.offset];
            self.offset += 1;
        }
    }

    fn reset(&mut self) {
        self.init();
    }
}

impl Drop for Sosemanuk {
    fn drop(&mut self) {
        self.lfsr.zeroize();
        self.r1.zeroize();
        self.r2.zeroize();
        self.block.zeroize();
        self.key.zeroize();
        self.iv.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_tables_invert() {
        for x in [1u32, 0xdead_beef, 0x8000_0001, 0x0123_4567] {
            assert_eq!(div_alpha(mul_alpha(x)), x);
            assert_eq!(mul_alpha(div_alpha(x)), x);
        }
    }

    #[test]
    fn chunked_equals_one_shot() {
        let key = [0xa5u8; 32];
        let iv = [0x5au8; 16];
        let mut a = Sosemanuk::new(&key, &iv).unwrap();
        let mut one = vec![0u8; 160];
        a.apply_keystream(&mut one);
        let mut b = Sosemanuk::new(&key, &iv).unwrap();
        let mut chunked = vec![0u8; 160];
        for c in chunked.chunks_mut(11) {
            b.apply_keystream(c);
        }
        assert_eq!(one, chunked);
    }

    #[test]
    fn reset_restores_keystream() {
        let mut c = Sosemanuk::new(&[3u8; 16], &[1u8; 16]).unwrap();
        let mut a = [0u8; 64];
        c.apply_keystream(&mut a);
        c.reset();
        let mut b = [0u8; 64];
        c.apply_keystream(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_nonces_distinct_streams() {
        let key = [9u8; 16];
        let mut a = Sosemanuk::new(&key, &[0u8; 16]).unwrap();
        let mut b = Sosemanuk::new(&key, &[1u8; 16]).unwrap();
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        a.apply_keystream(&mut x);
        b.apply_keystream(&mut y);
        assert_ne!(x, y);
    }
}
