//! IDEA (Lai–Massey). 64-bit block, 128-bit key.

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;

const BLOCK_SIZE: usize = 8;
const SUBKEYS: usize = 52;

/// Multiplication in GF(2^16 + 1) with 0 representing 2^16.
#[inline]
fn mul(a: u16, b: u16) -> u16 {
    if a == 0 {
        return (0x10001u32.wrapping_sub(u32::from(b))) as u16;
    }
    if b == 0 {
        return (0x10001u32.wrapping_sub(u32::from(a))) as u16;
    }
    let p = u32::from(a) * u32::from(b);
    let (hi, lo) = (p >> 16, p & 0xffff);
    (lo.wrapping_sub(hi).wrapping_add(if lo < hi { 1 } else { 0 })) as u16
}

/// Multiplicative inverse modulo 2^16 + 1 (0 and 1 are self-inverse).
fn mul_inv(x: u16) -> u16 {
    if x <= 1 {
        return x;
    }
    let modulus = 0x10001i64;
    let (mut t0, mut t1) = (0i64, 1i64);
    let (mut r0, mut r1) = (modulus, i64::from(x));
    while r1 != 0 {
        let q = r0 / r1;
        (t0, t1) = (t1, t0 - q * t1);
        (r0, r1) = (r1, r0 - q * r1);
    }
    t0.rem_euclid(modulus) as u16
}

#[inline]
fn add_inv(x: u16) -> u16 {
    x.wrapping_neg()
}

/// IDEA with expanded encryption and decryption subkeys.
pub struct Idea {
    ek: [u16; SUBKEYS],
    dk: [u16; SUBKEYS],
}

impl Idea {
    /// Expand a 16-byte key.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 16 {
            return Err(CryptoError::InvalidKeySize);
        }
        // 25-bit left rotation of the 128-bit key between groups of 8
        let mut ek = [0u16; SUBKEYS];
        let mut hi = u64::from_be_bytes(key[..8].try_into().unwrap());
        let mut lo = u64::from_be_bytes(key[8..].try_into().unwrap());
        let mut filled = 0;
        while filled < SUBKEYS {
            for i in 0..8 {
                if filled == SUBKEYS {
                    break;
                }
                let word = if i < 4 {
                    (hi >> (48 - 16 * i)) as u16
                } else {
                    (lo >> (48 - 16 * (i - 4))) as u16
                };
                ek[filled] = word;
                filled += 1;
            }
            let nhi = (hi << 25) | (lo >> 39);
            let nlo = (lo << 25) | (hi >> 39);
            hi = nhi;
            lo = nlo;
        }

        // Invert the schedule for decryption
        let mut dk = [0u16; SUBKEYS];
        dk[0] = mul_inv(ek[48]);
        dk[1] = add_inv(ek[49]);
        dk[2] = add_inv(ek[50]);
        dk[3] = mul_inv(ek[51]);
        for r in 1..8 {
            let i = (8 - r) * 6;
            dk[6 * r - 2] = ek[i + 4];
            dk[6 * r - 1] = ek[i + 5];
            dk[6 * r] = mul_inv(ek[i]);
            dk[6 * r + 1] = add_inv(ek[i + 2]);
            dk[6 * r + 2] = add_inv(ek[i + 1]);
            dk[6 * r + 3] = mul_inv(ek[i + 3]);
        }
        dk[46] = ek[4];
        dk[47] = ek[5];
        dk[48] = mul_inv(ek[0]);
        dk[49] = add_inv(ek[1]);
        dk[50] = add_inv(ek[2]);
        dk[51] = mul_inv(ek[3]);
        Ok(Idea { ek, dk })
    }

    fn crypt(ks: &[u16; SUBKEYS], block: &mut [u8]) {
        let mut x1 = u16::from_be_bytes(block[0..2].try_into().unwrap());
        let mut x2 = u16::from_be_bytes(block[2..4].try_into().unwrap());
        let mut x3 = u16::from_be_bytes(block[4..6].try_into().unwrap());
        let mut x4 = u16::from_be_bytes(block[6..8].try_into().unwrap());
        for r in 0..8 {
            let k = &ks[6 * r..6 * r + 6];
            x1 = mul(x1, k[0]);
            x2 = x2.wrapping_add(k[1]);
            x3 = x3.wrapping_add(k[2]);
            x4 = mul(x4, k[3]);
            let t0 = mul(x1 ^ x3, k[4]);
            let t1 = mul((x2 ^ x4).wrapping_add(t0), k[5]);
            let t0 = t0.wrapping_add(t1);
            x1 ^= t1;
            x4 ^= t0;
            let nx2 = x3 ^ t1;
            x3 = x2 ^ t0;
            x2 = nx2;
        }
        let (x2, x3) = (x3, x2);
        x1 = mul(x1, ks[48]);
        let x2 = x2.wrapping_add(ks[49]);
        let x3 = x3.wrapping_add(ks[50]);
        x4 = mul(x4, ks[51]);
        block[0..2].copy_from_slice(&x1.to_be_bytes());
        block[2..4].copy_from_slice(&x2.to_be_bytes());
        block[4..6].copy_from_slice(&x3.to_be_bytes());
        block[6..8].copy_from_slice(&x4.to_be_bytes());
    }
}

impl shroud_core::BlockCipher for Idea {
    fn name(&self) -> &'static str {
        "IDEA"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        Self::crypt(&self.ek, block);
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        Self::crypt(&self.dk, block);
        Ok(())
    }
}

impl Drop for Idea {
    fn drop(&mut self) {
        self.ek.zeroize();
        self.dk.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    #[test]
    fn classic_vector() {
        let c = Idea::new(&hex!("00010002000300040005000600070008")).unwrap();
        let mut b = hex!("0000000100020003");
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("11fbed2b01986de5"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("0000000100020003"));
    }

    #[test]
    fn mul_identities() {
        assert_eq!(mul(0, 0), 1); // 2^16 * 2^16 = 2^32 mod (2^16+1) = 1
        assert_eq!(mul(1, 5), 5);
        for x in [2u16, 77, 0x1234, 0xffff] {
            assert_eq!(mul(x, mul_inv(x)), 1);
        }
    }

    #[test]
    fn rejects_bad_key() {
        assert!(Idea::new(&[0u8; 24]).is_err());
    }
}
