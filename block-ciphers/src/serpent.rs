//! Serpent. 128-bit block, keys up to 256 bits.
//!
//! The S-boxes are applied bitslice-wise over the four working words;
//! short keys are padded with a single 1-bit per the submission.

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;

const BLOCK_SIZE: usize = 16;
const ROUNDS: usize = 32;
const PHI: u32 = 0x9e37_79b9;

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

const fn invert(s: [u8; 16]) -> [u8; 16] {
    let mut inv = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        inv[s[i] as usize] = i as u8;
        i += 1;
    }
    inv
}

const INV_SBOX: [[u8; 16]; 8] = [
    invert(SBOX[0]),
    invert(SBOX[1]),
    invert(SBOX[2]),
    invert(SBOX[3]),
    invert(SBOX[4]),
    invert(SBOX[5]),
    invert(SBOX[6]),
    invert(SBOX[7]),
];

/// Apply a 4-bit S-box across all 32 bit positions.
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

fn linear(x: &mut [u32; 4]) {
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

fn linear_inv(x: &mut [u32; 4]) {
    x[2] = x[2].rotate_right(22);
    x[0] = x[0].rotate_right(5);
    x[2] ^= x[3] ^ (x[1] << 7);
    x[0] ^= x[1] ^ x[3];
    x[3] = x[3].rotate_right(7);
    x[1] = x[1].rotate_right(1);
    x[3] ^= x[2] ^ (x[0] << 3);
    x[1] ^= x[0] ^ x[2];
    x[2] = x[2].rotate_right(3);
    x[0] = x[0].rotate_right(13);
}

/// Serpent with the 33 expanded round keys.
pub struct Serpent {
    rk: [[u32; 4]; ROUNDS + 1],
}

impl Serpent {
    /// Accepts 16, 24 or 32-byte keys.
    pub fn new(key: &[u8]) -> Result<Self> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeySize);
        }
        let mut padded = [0u8; 32];
        padded[..key.len()].copy_from_slice(key);
        if key.len() < 32 {
            padded[key.len()] = 0x01;
        }
        let mut w = [0u32; 140];
        for i in 0..8 {
            w[i] = u32::from_le_bytes(padded[4 * i..4 * i + 4].try_into().unwrap());
        }
        for i in 0..132 {
            w[i + 8] =
                (w[i] ^ w[i + 3] ^ w[i + 5] ^ w[i + 7] ^ PHI ^ i as u32).rotate_left(11);
        }
        let mut rk = [[0u32; 4]; ROUNDS + 1];
        for (r, keys) in rk.iter_mut().enumerate() {
            let box_idx = (3 + 8 - (r % 8)) % 8;
            let words = [w[8 + 4 * r], w[9 + 4 * r], w[10 + 4 * r], w[11 + 4 * r]];
            *keys = sbox_bitslice(&SBOX[box_idx], words);
        }
        padded.zeroize();
        w.zeroize();
        Ok(Serpent { rk })
    }
}

impl shroud_core::BlockCipher for Serpent {
    fn name(&self) -> &'static str {
        "Serpent"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut x = [0u32; 4];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            x[i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        for r in 0..ROUNDS - 1 {
            for i in 0..4 {
                x[i] ^= self.rk[r][i];
            }
            x = sbox_bitslice(&SBOX[r % 8], x);
            linear(&mut x);
        }
        for i in 0..4 {
            x[i] ^= self.rk[ROUNDS - 1][i];
        }
        x = sbox_bitslice(&SBOX[7], x);
        for i in 0..4 {
            x[i] ^= self.rk[ROUNDS][i];
        }
        for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&x[i].to_le_bytes());
        }
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut x = [0u32; 4];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            x[i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        for i in 0..4 {
            x[i] ^= self.rk[ROUNDS][i];
        }
        x = sbox_bitslice(&INV_SBOX[7], x);
        for i in 0..4 {
            x[i] ^= self.rk[ROUNDS - 1][i];
        }
        for r in (0..ROUNDS - 1).rev() {
            linear_inv(&mut x);
            x = sbox_bitslice(&INV_SBOX[r % 8], x);
            for i in 0..4 {
                x[i] ^= self.rk[r][i];
            }
        }
        for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&x[i].to_le_bytes());
        }
        Ok(())
    }
}

impl Drop for Serpent {
    fn drop(&mut self) {
        for k in self.rk.iter_mut() {
            k.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    #[test]
    fn known_answers() {
        let c = Serpent::new(&hex!("000102030405060708090a0b0c0d0e0f")).unwrap();
        let mut b = [0u8; 16];
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("57fa412638aa3dc9e425a76e3a8a2f42"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, [0u8; 16]);

        let c = Serpent::new(&hex!(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f"
        ))
        .unwrap();
        let mut b = [0u8; 16];
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("eaa13861df3aa19452d04e776287cd4a"));
    }

    #[test]
    fn round_trips_all_key_sizes() {
        for klen in [16usize, 24, 32] {
            let key: Vec<u8> = (0..klen as u8).collect();
            let c = Serpent::new(&key).unwrap();
            let mut b = *b"serpent in slice";
            let pt = b;
            c.encrypt_block(&mut b).unwrap();
            assert_ne!(b, pt);
            c.decrypt_block(&mut b).unwrap();
            assert_eq!(b, pt);
        }
    }

    #[test]
    fn inverse_boxes_invert() {
        for s in 0..8 {
            for v in 0..16u8 {
                assert_eq!(INV_SBOX[s][SBOX[s][v as usize] as usize], v);
            }
        }
    }

    #[test]
    fn distinct_keys_distinct_ciphertext() {
        let a = Serpent::new(&[0u8; 16]).unwrap();
        let b = Serpent::new(&[1u8; 16]).unwrap();
        let mut x = [0u8; 16];
        let mut y = [0u8; 16];
        a.encrypt_block(&mut x).unwrap();
        b.encrypt_block(&mut y).unwrap();
        assert_ne!(x, y);
    }
}
