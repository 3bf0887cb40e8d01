//! Triple-DES (EDE). 64-bit block, two-key (128-bit) or three-key
//! (192-bit) keying.
//!
//! The single-DES core uses combined S/P lookup tables and
//! bit-twiddled initial/final permutations; parity bits of the key
//! bytes are ignored, as usual.

mod tables;

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;
use tables::{SKB, SP};

const BLOCK_SIZE: usize = 8;

const SHIFTS2: [bool; 16] = [
    false, false, true, true, true, true, true, true, false, true, true, true, true, true, true,
    false,
];

/// PERM_OP: swap the bits of `a`/`b` selected by `m` at distance `n`.
#[inline]
fn perm(a: u32, b: u32, n: u32, m: u32) -> (u32, u32) {
    let t = ((a >> n) ^ b) & m;
    (a ^ (t << n), b ^ t)
}

/// Expand one 64-bit key into 32 subkey words.
fn set_key(key: &[u8; 8]) -> [u32; 32] {
    let mut c = u32::from_le_bytes(key[..4].try_into().unwrap());
    let mut d = u32::from_le_bytes(key[4..].try_into().unwrap());

    let (nd, nc) = perm(d, c, 4, 0x0f0f_0f0f);
    d = nd;
    c = nc;
    let t = ((c << 18) ^ c) & 0xcccc_0000;
    c = c ^ t ^ (t >> 18);
    let t = ((d << 18) ^ d) & 0xcccc_0000;
    d = d ^ t ^ (t >> 18);
    let (nd, nc) = perm(d, c, 1, 0x5555_5555);
    d = nd;
    c = nc;
    let (nc, nd) = perm(c, d, 8, 0x00ff_00ff);
    c = nc;
    d = nd;
    let (nd, nc) = perm(d, c, 1, 0x5555_5555);
    d = nd;
    c = nc;
    d = ((d & 0x0000_00ff) << 16)
        | (d & 0x0000_ff00)
        | ((d & 0x00ff_0000) >> 16)
        | ((c & 0xf000_0000) >> 4);
    c &= 0x0fff_ffff;

    let mut ks = [0u32; 32];
    for i in 0..16 {
        if SHIFTS2[i] {
            c = (c >> 2) | (c << 26);
            d = (d >> 2) | (d << 26);
        } else {
            c = (c >> 1) | (c << 27);
            d = (d >> 1) | (d << 27);
        }
        c &= 0x0fff_ffff;
        d &= 0x0fff_ffff;
        let s = SKB[0][(c & 0x3f) as usize]
            | SKB[1][(((c >> 6) & 0x03) | ((c >> 7) & 0x3c)) as usize]
            | SKB[2][(((c >> 13) & 0x0f) | ((c >> 14) & 0x30)) as usize]
            | SKB[3][(((c >> 20) & 0x01) | ((c >> 21) & 0x06) | ((c >> 22) & 0x38)) as usize];
        let t = SKB[4][(d & 0x3f) as usize]
            | SKB[5][(((d >> 7) & 0x03) | ((d >> 8) & 0x3c)) as usize]
            | SKB[6][((d >> 15) & 0x3f) as usize]
            | SKB[7][(((d >> 21) & 0x0f) | ((d >> 22) & 0x30)) as usize];
        ks[2 * i] = ((t << 16) | (s & 0x0000_ffff)).rotate_right(30);
        ks[2 * i + 1] = ((s >> 16) | (t & 0xffff_0000)).rotate_right(26);
    }
    ks
}

fn initial_permutation(mut l: u32, mut r: u32) -> (u32, u32) {
    let (nr, nl) = perm(r, l, 4, 0x0f0f_0f0f);
    r = nr;
    l = nl;
    let (nl, nr) = perm(l, r, 16, 0x0000_ffff);
    l = nl;
    r = nr;
    let (nr, nl) = perm(r, l, 2, 0x3333_3333);
    r = nr;
    l = nl;
    let (nl, nr) = perm(l, r, 8, 0x00ff_00ff);
    l = nl;
    r = nr;
    let (nr, nl) = perm(r, l, 1, 0x5555_5555);
    (nl, nr)
}

fn final_permutation(mut l: u32, mut r: u32) -> (u32, u32) {
    let (nr, nl) = perm(r, l, 1, 0x5555_5555);
    r = nr;
    l = nl;
    let (nl, nr) = perm(l, r, 8, 0x00ff_00ff);
    l = nl;
    r = nr;
    let (nr, nl) = perm(r, l, 2, 0x3333_3333);
    r = nr;
    l = nl;
    let (nl, nr) = perm(l, r, 16, 0x0000_ffff);
    l = nl;
    r = nr;
    let (nr, nl) = perm(r, l, 4, 0x0f0f_0f0f);
    (nl, nr)
}

/// Sixteen rounds over the rotated register representation.
fn rounds(block: &mut [u8; 8], ks: &[u32; 32], encrypt: bool) {
    let a = u32::from_le_bytes(block[..4].try_into().unwrap());
    let b = u32::from_le_bytes(block[4..].try_into().unwrap());
    let (l0, r0) = initial_permutation(a, b);
    let mut l = r0.rotate_right(29);
    let mut r = l0.rotate_right(29);
    for step in 0..16 {
        let i = if encrypt { 2 * step } else { 30 - 2 * step };
        let u = r ^ ks[i];
        let t = (r ^ ks[i + 1]).rotate_right(4);
        l ^= SP[0][((u >> 2) & 0x3f) as usize]
            ^ SP[2][((u >> 10) & 0x3f) as usize]
            ^ SP[4][((u >> 18) & 0x3f) as usize]
            ^ SP[6][((u >> 26) & 0x3f) as usize]
            ^ SP[1][((t >> 2) & 0x3f) as usize]
            ^ SP[3][((t >> 10) & 0x3f) as usize]
            ^ SP[5][((t >> 18) & 0x3f) as usize]
            ^ SP[7][((t >> 26) & 0x3f) as usize];
        core::mem::swap(&mut l, &mut r);
    }
    let (x, y) = final_permutation(l.rotate_right(3), r.rotate_right(3));
    block[..4].copy_from_slice(&x.to_le_bytes());
    block[4..].copy_from_slice(&y.to_le_bytes());
}

/// EDE Triple-DES.
pub struct TripleDes {
    ks1: [u32; 32],
    ks2: [u32; 32],
    ks3: [u32; 32],
}

impl TripleDes {
    /// Two-key (16-byte, K3 = K1) or three-key (24-byte) EDE.
    pub fn new(key: &[u8]) -> Result<Self> {
        let (k1, k2, k3): ([u8; 8], [u8; 8], [u8; 8]) = match key.len() {
            16 => (
                key[..8].try_into().unwrap(),
                key[8..16].try_into().unwrap(),
                key[..8].try_into().unwrap(),
            ),
            24 => (
                key[..8].try_into().unwrap(),
                key[8..16].try_into().unwrap(),
                key[16..24].try_into().unwrap(),
            ),
            _ => return Err(CryptoError::InvalidKeySize),
        };
        Ok(TripleDes {
            ks1: set_key(&k1),
            ks2: set_key(&k2),
            ks3: set_key(&k3),
        })
    }
}

impl shroud_core::BlockCipher for TripleDes {
    fn name(&self) -> &'static str {
        "TripleDES"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut b: [u8; 8] = block.try_into().unwrap();
        rounds(&mut b, &self.ks1, true);
        rounds(&mut b, &self.ks2, false);
        rounds(&mut b, &self.ks3, true);
        block.copy_from_slice(&b);
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut b: [u8; 8] = block.try_into().unwrap();
        rounds(&mut b, &self.ks3, false);
        rounds(&mut b, &self.ks2, true);
        rounds(&mut b, &self.ks1, false);
        block.copy_from_slice(&b);
        Ok(())
    }
}

impl Drop for TripleDes {
    fn drop(&mut self) {
        self.ks1.zeroize();
        self.ks2.zeroize();
        self.ks3.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // Single-DES classic vector driven through the raw rounds.
    #[test]
    fn classic_single_des_vector() {
        let ks = set_key(&hex!("0123456789abcdef"));
        let mut b = hex!("4e6f772069732074"); // "Now is t"
        rounds(&mut b, &ks, true);
        assert_eq!(b, hex!("3fa40e8a984d4815"));
        rounds(&mut b, &ks, false);
        assert_eq!(b, hex!("4e6f772069732074"));
    }

    #[test]
    fn two_key_matches_three_key_with_k3_eq_k1() {
        let k2 = hex!("0123456789abcdeffedcba9876543210");
        let mut k3 = [0u8; 24];
        k3[..16].copy_from_slice(&k2);
        k3[16..].copy_from_slice(&k2[..8]);
        let a = TripleDes::new(&k2).unwrap();
        let b = TripleDes::new(&k3).unwrap();
        let mut x = hex!("0011223344556677");
        let mut y = x;
        a.encrypt_block(&mut x).unwrap();
        b.encrypt_block(&mut y).unwrap();
        assert_eq!(x, y);
    }

    #[test]
    fn ede_round_trip() {
        let c = TripleDes::new(&hex!(
            "0123456789abcdef23456789abcdef01456789abcdef0123"
        ))
        .unwrap();
        let mut b = hex!("6bc1bee22e409f96");
        let pt = b;
        c.encrypt_block(&mut b).unwrap();
        assert_ne!(b, pt);
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, pt);
    }

    #[test]
    fn rejects_single_des_key() {
        assert!(TripleDes::new(&[0u8; 8]).is_err());
    }
}
