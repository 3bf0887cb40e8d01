//! RC6-32/20 (Rivest et al.). 128-bit block, 128/192/256-bit keys.

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;

const BLOCK_SIZE: usize = 16;
const ROUNDS: usize = 20;
const P32: u32 = 0xB7E1_5163;
const Q32: u32 = 0x9E37_79B9;

/// RC6 with the mixed subkey table.
pub struct Rc6 {
    s: [u32; 2 * ROUNDS + 4],
}

impl Rc6 {
    /// Mix a 16, 24 or 32-byte key into the subkey table.
    pub fn new(key: &[u8]) -> Result<Self> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeySize);
        }
        let c = key.len() / 4;
        let mut l = [0u32; 8];
        for (i, chunk) in key.chunks_exact(4).enumerate() {
            l[i] = u32::from_le_bytes(chunk.try_into().unwrap());
        }
        let mut s = [0u32; 2 * ROUNDS + 4];
        s[0] = P32;
        for i in 1..s.len() {
            s[i] = s[i - 1].wrapping_add(Q32);
        }
        let (mut a, mut b) = (0u32, 0u32);
        let (mut i, mut j) = (0usize, 0usize);
        for _ in 0..3 * s.len().max(c) {
            a = s[i].wrapping_add(a).wrapping_add(b).rotate_left(3);
            s[i] = a;
            b = l[j].wrapping_add(a).wrapping_add(b).rotate_left(a.wrapping_add(b));
            l[j] = b;
            i = (i + 1) % s.len();
            j = (j + 1) % c;
        }
        l.zeroize();
        Ok(Rc6 { s })
    }
}

impl shroud_core::BlockCipher for Rc6 {
    fn name(&self) -> &'static str {
        "RC6"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let s = &self.s;
        let mut a = u32::from_le_bytes(block[0..4].try_into().unwrap());
        let mut b = u32::from_le_bytes(block[4..8].try_into().unwrap());
        let mut c = u32::from_le_bytes(block[8..12].try_into().unwrap());
        let mut d = u32::from_le_bytes(block[12..16].try_into().unwrap());
        b = b.wrapping_add(s[0]);
        d = d.wrapping_add(s[1]);
        for i in 1..=ROUNDS {
            let t = b.wrapping_mul(b.wrapping_mul(2).wrapping_add(1)).rotate_left(5);
            let u = d.wrapping_mul(d.wrapping_mul(2).wrapping_add(1)).rotate_left(5);
            a = (a ^ t).rotate_left(u).wrapping_add(s[2 * i]);
            c = (c ^ u).rotate_left(t).wrapping_add(s[2 * i + 1]);
            (a, b, c, d) = (b, c, d, a);
        }
        a = a.wrapping_add(s[2 * ROUNDS + 2]);
        c = c.wrapping_add(s[2 * ROUNDS + 3]);
        block[0..4].copy_from_slice(&a.to_le_bytes());
        block[4..8].copy_from_slice(&b.to_le_bytes());
        block[8..12].copy_from_slice(&c.to_le_bytes());
        block[12..16].copy_from_slice(&d.to_le_bytes());
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let s = &self.s;
        let mut a = u32::from_le_bytes(block[0..4].try_into().unwrap());
        let mut b = u32::from_le_bytes(block[4..8].try_into().unwrap());
        let mut c = u32::from_le_bytes(block[8..12].try_into().unwrap());
        let mut d = u32::from_le_bytes(block[12..16].try_into().unwrap());
        c = c.wrapping_sub(s[2 * ROUNDS + 3]);
        a = a.wrapping_sub(s[2 * ROUNDS + 2]);
        for i in (1..=ROUNDS).rev() {
            (a, b, c, d) = (d, a, b, c);
            let u = d.wrapping_mul(d.wrapping_mul(2).wrapping_add(1)).rotate_left(5);
            let t = b.wrapping_mul(b.wrapping_mul(2).wrapping_add(1)).rotate_left(5);
            c = c.wrapping_sub(s[2 * i + 1]).rotate_right(t) ^ u;
            a = a.wrapping_sub(s[2 * i]).rotate_right(u) ^ t;
        }
        d = d.wrapping_sub(s[1]);
        b = b.wrapping_sub(s[0]);
        block[0..4].copy_from_slice(&a.to_le_bytes());
        block[4..8].copy_from_slice(&b.to_le_bytes());
        block[8..12].copy_from_slice(&c.to_le_bytes());
        block[12..16].copy_from_slice(&d.to_le_bytes());
        Ok(())
    }
}

impl Drop for Rc6 {
    fn drop(&mut self) {
        self.s.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // Vectors from the AES-submission paper.
    #[test]
    fn paper_vectors() {
        let c = Rc6::new(&[0u8; 16]).unwrap();
        let mut b = [0u8; 16];
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("8fc3a53656b1f778c129df4e9848a41e"));

        let c = Rc6::new(&hex!("0123456789abcdef0112233445566778")).unwrap();
        let mut b = hex!("02132435465768798a9bacbdcedfe0f1");
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("524e192f4715c6231f51f6367ea43f18"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("02132435465768798a9bacbdcedfe0f1"));
    }

    #[test]
    fn key_sizes() {
        assert!(Rc6::new(&[0u8; 16]).is_ok());
        assert!(Rc6::new(&[0u8; 24]).is_ok());
        assert!(Rc6::new(&[0u8; 32]).is_ok());
        assert!(Rc6::new(&[0u8; 20]).is_err());
    }
}
