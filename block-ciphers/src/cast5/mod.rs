//! CAST5 / CAST-128 (RFC 2144). 64-bit block, 40..128-bit keys.

pub(crate) mod tables;

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;
use tables::{S1, S2, S3, S4, S5, S6, S7, S8};

const BLOCK_SIZE: usize = 8;

#[inline]
fn b0(x: u32) -> usize {
    (x & 0xff) as usize
}
#[inline]
fn b1(x: u32) -> usize {
    ((x >> 8) & 0xff) as usize
}
#[inline]
fn b2(x: u32) -> usize {
    ((x >> 16) & 0xff) as usize
}
#[inline]
fn b3(x: u32) -> usize {
    (x >> 24) as usize
}

/// One half of the RFC 2144 schedule: emits 16 subkey words and
/// advances the x registers. Run twice: masking keys, then rotations.
fn schedule_half(x: &mut [u32; 4]) -> [u32; 16] {
    let [x0, x1, x2, x3] = *x;
    let z0_0 = S6[b0(x3)] ^ S7[b3(x3)] ^ x0 ^ S7[b3(x2)] ^ S5[b2(x3)] ^ S8[b1(x3)];
    let z1_0 = x2 ^ S8[b1(x2)] ^ S5[b3(z0_0)] ^ S8[b0(z0_0)] ^ S6[b1(z0_0)] ^ S7[b2(z0_0)];
    let z2_0 = S5[b2(x2)] ^ x3 ^ S5[b0(z1_0)] ^ S8[b3(z1_0)] ^ S6[b1(z1_0)] ^ S7[b2(z1_0)];
    let z3_0 = S6[b0(x2)] ^ x1 ^ S7[b0(z2_0)] ^ S8[b3(z2_0)] ^ S5[b1(z2_0)] ^ S6[b2(z2_0)];
    let k0_0 = S7[b0(z1_0)] ^ S5[b1(z0_0)] ^ S8[b1(z1_0)] ^ S5[b3(z2_0)] ^ S6[b2(z2_0)];
    let k1_0 = S6[b0(z2_0)] ^ S8[b3(z1_0)] ^ S5[b1(z2_0)] ^ S7[b2(z1_0)] ^ S6[b1(z1_0)];
    let k2_0 = S5[b3(z3_0)] ^ S7[b0(z0_0)] ^ S6[b2(z3_0)] ^ S8[b1(z0_0)] ^ S7[b2(z2_0)];
    let k3_0 = S6[b0(z3_0)] ^ S8[b3(z0_0)] ^ S8[b3(z3_0)] ^ S5[b1(z3_0)] ^ S7[b2(z0_0)];
    let x0_0 = S6[b0(z1_0)] ^ S7[b3(z1_0)] ^ z2_0 ^ S7[b3(z0_0)] ^ S5[b2(z1_0)] ^ S8[b1(z1_0)];
    let x1_0 = z0_0 ^ S8[b1(z0_0)] ^ S5[b3(x0_0)] ^ S8[b0(x0_0)] ^ S6[b1(x0_0)] ^ S7[b2(x0_0)];
    let x2_0 = S7[b2(x1_0)] ^ S5[b2(z0_0)] ^ z1_0 ^ S5[b0(x1_0)] ^ S8[b3(x1_0)] ^ S6[b1(x1_0)];
    let x3_0 = S6[b0(z0_0)] ^ z3_0 ^ S7[b0(x2_0)] ^ S8[b3(x2_0)] ^ S5[b1(x2_0)] ^ S6[b2(x2_0)];
    let k4_0 = S5[b3(x2_0)] ^ S6[b1(x0_0)] ^ S5[b0(x0_0)] ^ S7[b3(x3_0)] ^ S8[b2(x3_0)];
    let k5_0 = S6[b3(x0_0)] ^ S8[b0(x3_0)] ^ S5[b2(x0_0)] ^ S7[b1(x3_0)] ^ S6[b2(x3_0)];
    let k6_0 = S5[b0(x1_0)] ^ S7[b3(x2_0)] ^ S7[b0(x0_0)] ^ S6[b1(x1_0)] ^ S8[b2(x2_0)];
    let k7_0 = S6[b3(x1_0)] ^ S8[b0(x2_0)] ^ S8[b0(x1_0)] ^ S5[b2(x1_0)] ^ S7[b1(x2_0)];
    let z0_1 = S6[b0(x3_0)] ^ S7[b3(x3_0)] ^ x0_0 ^ S7[b3(x2_0)] ^ S5[b2(x3_0)] ^ S8[b1(x3_0)];
    let z1_1 = x2_0 ^ S8[b1(x2_0)] ^ S5[b3(z0_1)] ^ S8[b0(z0_1)] ^ S6[b1(z0_1)] ^ S7[b2(z0_1)];
    let z2_1 = S5[b2(x2_0)] ^ x3_0 ^ S5[b0(z1_1)] ^ S8[b3(z1_1)] ^ S6[b1(z1_1)] ^ S7[b2(z1_1)];
    let z3_1 = S6[b0(x2_0)] ^ x1_0 ^ S7[b0(z2_1)] ^ S8[b3(z2_1)] ^ S5[b1(z2_1)] ^ S6[b2(z2_1)];
    let k8_0 = S6[b1(z0_1)] ^ S5[b0(z0_1)] ^ S5[b2(z2_1)] ^ S7[b3(z3_1)] ^ S8[b2(z3_1)];
    let k9_0 = S6[b3(z0_1)] ^ S8[b0(z3_1)] ^ S6[b3(z3_1)] ^ S5[b2(z0_1)] ^ S7[b1(z3_1)];
    let k10_0 = S5[b0(z1_1)] ^ S7[b3(z2_1)] ^ S6[b1(z1_1)] ^ S8[b2(z2_1)] ^ S7[b1(z0_1)];
    let k11_0 = S6[b3(z1_1)] ^ S8[b0(z2_1)] ^ S5[b2(z1_1)] ^ S7[b1(z2_1)] ^ S8[b1(z1_1)];
    let x0_1 = S6[b0(z1_1)] ^ S7[b3(z1_1)] ^ z2_1 ^ S7[b3(z0_1)] ^ S5[b2(z1_1)] ^ S8[b1(z1_1)];
    let x1_1 = S6[b1(x0_1)] ^ z0_1 ^ S8[b1(z0_1)] ^ S5[b3(x0_1)] ^ S8[b0(x0_1)] ^ S7[b2(x0_1)];
    let x2_1 = S7[b2(x1_1)] ^ S5[b2(z0_1)] ^ z1_1 ^ S5[b0(x1_1)] ^ S8[b3(x1_1)] ^ S6[b1(x1_1)];
    let x3_1 = S6[b0(z0_1)] ^ z3_1 ^ S7[b0(x2_1)] ^ S8[b3(x2_1)] ^ S5[b1(x2_1)] ^ S6[b2(x2_1)];
    let k12_0 = S7[b0(x1_1)] ^ S5[b0(x0_1)] ^ S8[b1(x1_1)] ^ S5[b3(x2_1)] ^ S6[b2(x2_1)];
    let k13_0 = S6[b0(x2_1)] ^ S8[b3(x1_1)] ^ S6[b0(x1_1)] ^ S5[b1(x2_1)] ^ S7[b2(x1_1)];
    let k14_0 = S5[b3(x3_1)] ^ S7[b0(x0_1)] ^ S7[b3(x2_1)] ^ S6[b2(x3_1)] ^ S8[b1(x0_1)];
    let k15_0 = S6[b0(x3_1)] ^ S8[b3(x0_1)] ^ S5[b1(x3_1)] ^ S7[b2(x0_1)] ^ S8[b2(x3_1)];
    *x = [x0_1, x1_1, x2_1, x3_1];
    [
        k0_0, k1_0, k2_0, k3_0, k4_0, k5_0, k6_0, k7_0, k8_0, k9_0, k10_0, k11_0, k12_0, k13_0,
        k14_0, k15_0,
    ]
}

/// Round function type 1 (rounds 1, 4, 7, ...).
pub(crate) fn f1(d: u32, km: u32, kr: u32) -> u32 {
    let i = km.wrapping_add(d).rotate_left(kr);
    ((S1[b3(i)] ^ S2[b2(i)]).wrapping_sub(S3[b1(i)])).wrapping_add(S4[b0(i)])
}

/// Round function type 2.
pub(crate) fn f2(d: u32, km: u32, kr: u32) -> u32 {
    let i = (km ^ d).rotate_left(kr);
    (S1[b3(i)].wrapping_sub(S2[b2(i)]).wrapping_add(S3[b1(i)])) ^ S4[b0(i)]
}

/// Round function type 3.
pub(crate) fn f3(d: u32, km: u32, kr: u32) -> u32 {
    let i = km.wrapping_sub(d).rotate_left(kr);
    (S1[b3(i)].wrapping_add(S2[b2(i)]) ^ S3[b1(i)]).wrapping_sub(S4[b0(i)])
}

/// CAST5 with masking and rotation subkeys.
pub struct Cast5 {
    km: [u32; 16],
    kr: [u32; 16],
    rounds: usize,
}

impl Cast5 {
    /// Derive subkeys. Keys run 5..=16 bytes; 80 bits or less selects
    /// the 12-round variant per RFC 2144 §2.5.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() < 5 || key.len() > 16 {
            return Err(CryptoError::InvalidKeySize);
        }
        let rounds = if key.len() <= 10 { 12 } else { 16 };
        let mut padded = [0u8; 16];
        padded[..key.len()].copy_from_slice(key);
        let mut x = [
            u32::from_be_bytes(padded[0..4].try_into().unwrap()),
            u32::from_be_bytes(padded[4..8].try_into().unwrap()),
            u32::from_be_bytes(padded[8..12].try_into().unwrap()),
            u32::from_be_bytes(padded[12..16].try_into().unwrap()),
        ];
        let km = schedule_half(&mut x);
        let mut kr = schedule_half(&mut x);
        for r in kr.iter_mut() {
            *r &= 0x1f;
        }
        padded.zeroize();
        x.zeroize();
        Ok(Cast5 { km, kr, rounds })
    }

    #[inline]
    fn round(&self, i: usize, l: u32, r: u32) -> (u32, u32) {
        let f = match i % 3 {
            0 => f1,
            1 => f2,
            _ => f3,
        };
        (r, l ^ f(r, self.km[i], self.kr[i]))
    }
}

impl shroud_core::BlockCipher for Cast5 {
    fn name(&self) -> &'static str {
        "CAST5"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut l = u32::from_be_bytes(block[..4].try_into().unwrap());
        let mut r = u32::from_be_bytes(block[4..].try_into().unwrap());
        for i in 0..self.rounds {
            let (nl, nr) = self.round(i, l, r);
            l = nl;
            r = nr;
        }
        block[..4].copy_from_slice(&r.to_be_bytes());
        block[4..].copy_from_slice(&l.to_be_bytes());
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut l = u32::from_be_bytes(block[..4].try_into().unwrap());
        let mut r = u32::from_be_bytes(block[4..].try_into().unwrap());
        for i in (0..self.rounds).rev() {
            let (nl, nr) = self.round(i, l, r);
            l = nl;
            r = nr;
        }
        block[..4].copy_from_slice(&r.to_be_bytes());
        block[4..].copy_from_slice(&l.to_be_bytes());
        Ok(())
    }
}

impl Drop for Cast5 {
    fn drop(&mut self) {
        self.km.zeroize();
        self.kr.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // RFC 2144 appendix B.1, 128-bit key.
    #[test]
    fn rfc2144_full_key() {
        let c = Cast5::new(&hex!("0123456712345678234567893456789a")).unwrap();
        let mut b = hex!("0123456789abcdef");
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("238b4fe5847e44b2"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("0123456789abcdef"));
    }

    #[test]
    fn short_key_round_trip() {
        let c = Cast5::new(&hex!("01234567123456782345")).unwrap();
        assert_eq!(c.rounds, 12);
        let mut b = hex!("0123456789abcdef");
        c.encrypt_block(&mut b).unwrap();
        assert_ne!(b, hex!("0123456789abcdef"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("0123456789abcdef"));
    }

    #[test]
    fn key_size_limits() {
        assert!(Cast5::new(&[0u8; 4]).is_err());
        assert!(Cast5::new(&[0u8; 17]).is_err());
    }
}
