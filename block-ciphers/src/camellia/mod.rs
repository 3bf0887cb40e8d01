//! Camellia (RFC 3713). 128-bit block, 128/192/256-bit keys.

mod tables;

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;
use tables::SBOX1;

const BLOCK_SIZE: usize = 16;

/// RFC 3713 2.3: the six key-schedule constants.
const SIGMA: [u64; 6] = [
    0xA09E667F3BCC908B,
    0xB67AE8584CAA73B2,
    0xC6EF372FE94F82BE,
    0x54FF53A5F1D36F1C,
    0x10E527FADE682D1D,
    0xB05688C2B3E6C1FD,
];

#[inline]
fn s1(x: u8) -> u64 {
    u64::from(SBOX1[x as usize])
}

#[inline]
fn s2(x: u8) -> u64 {
    u64::from(SBOX1[x as usize].rotate_left(1))
}

#[inline]
fn s3(x: u8) -> u64 {
    u64::from(SBOX1[x as usize].rotate_right(1))
}

#[inline]
fn s4(x: u8) -> u64 {
    u64::from(SBOX1[x.rotate_left(1) as usize])
}

/// RFC 3713 2.4.1: S-function then P-function.
fn f(x: u64, k: u64) -> u64 {
    let x = x ^ k;
    let t1 = s1((x >> 56) as u8);
    let t2 = s2((x >> 48) as u8);
    let t3 = s3((x >> 40) as u8);
    let t4 = s4((x >> 32) as u8);
    let t5 = s2((x >> 24) as u8);
    let t6 = s3((x >> 16) as u8);
    let t7 = s4((x >> 8) as u8);
    let t8 = s1(x as u8);
    let y1 = t1 ^ t3 ^ t4 ^ t6 ^ t7 ^ t8;
    let y2 = t1 ^ t2 ^ t4 ^ t5 ^ t7 ^ t8;
    let y3 = t1 ^ t2 ^ t3 ^ t5 ^ t6 ^ t8;
    let y4 = t2 ^ t3 ^ t4 ^ t5 ^ t6 ^ t7;
    let y5 = t1 ^ t2 ^ t6 ^ t7 ^ t8;
    let y6 = t2 ^ t3 ^ t5 ^ t7 ^ t8;
    let y7 = t3 ^ t4 ^ t5 ^ t6 ^ t8;
    let y8 = t1 ^ t4 ^ t5 ^ t6 ^ t7;
    (y1 << 56) | (y2 << 48) | (y3 << 40) | (y4 << 32) | (y5 << 24) | (y6 << 16) | (y7 << 8) | y8
}

/// RFC 3713 2.4.3.
fn fl(x: u64, k: u64) -> u64 {
    let (mut xl, mut xr) = ((x >> 32) as u32, x as u32);
    let (kl, kr) = ((k >> 32) as u32, k as u32);
    xr ^= (xl & kl).rotate_left(1);
    xl ^= xr | kr;
    (u64::from(xl) << 32) | u64::from(xr)
}

fn fl_inv(y: u64, k: u64) -> u64 {
    let (mut yl, mut yr) = ((y >> 32) as u32, y as u32);
    let (kl, kr) = ((k >> 32) as u32, k as u32);
    yl ^= yr | kr;
    yr ^= (yl & kl).rotate_left(1);
    (u64::from(yl) << 32) | u64::from(yr)
}

/// 128-bit rotate over a (hi, lo) pair, returning the rotated halves.
fn rot128(hi: u64, lo: u64, n: u32) -> (u64, u64) {
    if n == 0 {
        return (hi, lo);
    }
    if n < 64 {
        (hi << n | lo >> (64 - n), lo << n | hi >> (64 - n))
    } else if n == 64 {
        (lo, hi)
    } else {
        let n = n - 64;
        (lo << n | hi >> (64 - n), hi << n | lo >> (64 - n))
    }
}

/// Camellia with expanded whitening, round and FL-layer subkeys.
pub struct Camellia {
    kw: [u64; 4],
    k: [u64; 24],
    ke: [u64; 8],
    rounds: usize,
    fl_layers: usize,
}

impl Camellia {
    /// Derive the subkey schedule. Keys are 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self> {
        let (kl, kr): ((u64, u64), (u64, u64)) = match key.len() {
            16 => {
                let hi = u64::from_be_bytes(key[0..8].try_into().unwrap());
                let lo = u64::from_be_bytes(key[8..16].try_into().unwrap());
                ((hi, lo), (0, 0))
            }
            24 => {
                let hi = u64::from_be_bytes(key[0..8].try_into().unwrap());
                let lo = u64::from_be_bytes(key[8..16].try_into().unwrap());
                let rh = u64::from_be_bytes(key[16..24].try_into().unwrap());
                ((hi, lo), (rh, !rh))
            }
            32 => {
                let hi = u64::from_be_bytes(key[0..8].try_into().unwrap());
                let lo = u64::from_be_bytes(key[8..16].try_into().unwrap());
                let rh = u64::from_be_bytes(key[16..24].try_into().unwrap());
                let rl = u64::from_be_bytes(key[24..32].try_into().unwrap());
                ((hi, lo), (rh, rl))
            }
            _ => return Err(CryptoError::InvalidKeySize),
        };

        // RFC 3713 2.2: derive KA and KB from KL, KR
        let mut d1 = kl.0 ^ kr.0;
        let mut d2 = kl.1 ^ kr.1;
        d2 ^= f(d1, SIGMA[0]);
        d1 ^= f(d2, SIGMA[1]);
        d1 ^= kl.0;
        d2 ^= kl.1;
        d2 ^= f(d1, SIGMA[2]);
        d1 ^= f(d2, SIGMA[3]);
        let ka = (d1, d2);
        let mut e1 = ka.0 ^ kr.0;
        let mut e2 = ka.1 ^ kr.1;
        e2 ^= f(e1, SIGMA[4]);
        e1 ^= f(e2, SIGMA[5]);
        let kb = (e1, e2);

        let hi = |p: (u64, u64), n| rot128(p.0, p.1, n).0;
        let lo = |p: (u64, u64), n| rot128(p.0, p.1, n).1;

        let mut kw = [0u64; 4];
        let mut k = [0u64; 24];
        let mut ke = [0u64; 8];
        let (rounds, fl_layers);
        if key.len() == 16 {
            rounds = 18;
            fl_layers = 2;
            kw[0] = hi(kl, 0);
            kw[1] = lo(kl, 0);
            k[0] = hi(ka, 0);
            k[1] = lo(ka, 0);
            k[2] = hi(kl, 15);
            k[3] = lo(kl, 15);
            k[4] = hi(ka, 15);
            k[5] = lo(ka, 15);
            ke[0] = hi(ka, 30);
            ke[1] = lo(ka, 30);
            k[6] = hi(kl, 45);
            k[7] = lo(kl, 45);
            k[8] = hi(ka, 45);
            k[9] = lo(kl, 60);
            k[10] = hi(ka, 60);
            k[11] = lo(ka, 60);
            ke[2] = hi(kl, 77);
            ke[3] = lo(kl, 77);
            k[12] = hi(kl, 94);
            k[13] = lo(kl, 94);
            k[14] = hi(ka, 94);
            k[15] = lo(ka, 94);
            k[16] = hi(kl, 111);
            k[17] = lo(kl, 111);
            kw[2] = hi(ka, 111);
            kw[3] = lo(ka, 111);
        } else {
            rounds = 24;
            fl_layers = 3;
            kw[0] = hi(kl, 0);
            kw[1] = lo(kl, 0);
            k[0] = hi(kb, 0);
            k[1] = lo(kb, 0);
            k[2] = hi(kr, 15);
            k[3] = lo(kr, 15);
            k[4] = hi(ka, 15);
            k[5] = lo(ka, 15);
            ke[0] = hi(kr, 30);
            ke[1] = lo(kr, 30);
            k[6] = hi(kb, 30);
            k[7] = lo(kb, 30);
            k[8] = hi(kl, 45);
            k[9] = lo(kl, 45);
            k[10] = hi(ka, 45);
            k[11] = lo(ka, 45);
            ke[2] = hi(kl, 60);
            ke[3] = lo(kl, 60);
            k[12] = hi(kr, 60);
            k[13] = lo(kr, 60);
            k[14] = hi(kb, 60);
            k[15] = lo(kb, 60);
            k[16] = hi(kl, 77);
            k[17] = lo(kl, 77);
            ke[4] = hi(ka, 77);
            ke[5] = lo(ka, 77);
            k[18] = hi(kr, 94);
            k[19] = lo(kr, 94);
            k[20] = hi(ka, 94);
            k[21] = lo(ka, 94);
            k[22] = hi(kl, 111);
            k[23] = lo(kl, 111);
            kw[2] = hi(kb, 111);
            kw[3] = lo(kb, 111);
        }
        Ok(Camellia { kw, k, ke, rounds, fl_layers })
    }

    fn transform(&self, block: &mut [u8], kw: &[u64; 4], k: &[u64], ke: &[u64]) {
        let mut d1 = u64::from_be_bytes(block[0..8].try_into().unwrap()) ^ kw[0];
        let mut d2 = u64::from_be_bytes(block[8..16].try_into().unwrap()) ^ kw[1];
        let mut kei = 0;
        for r in 0..self.rounds {
            if r > 0 && r % 6 == 0 {
                d1 = fl(d1, ke[kei]);
                d2 = fl_inv(d2, ke[kei + 1]);
                kei += 2;
            }
            if r % 2 == 0 {
                d2 ^= f(d1, k[r]);
            } else {
                d1 ^= f(d2, k[r]);
            }
        }
        d2 ^= kw[2];
        d1 ^= kw[3];
        block[0..8].copy_from_slice(&d2.to_be_bytes());
        block[8..16].copy_from_slice(&d1.to_be_bytes());
    }
}

impl shroud_core::BlockCipher for Camellia {
    fn name(&self) -> &'static str {
        "Camellia"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        self.transform(block, &self.kw, &self.k[..self.rounds], &self.ke[..2 * self.fl_layers]);
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        // Feistel inverse: whitening pairs swapped, round and FL-layer
        // keys reversed.
        let kw = [self.kw[2], self.kw[3], self.kw[0], self.kw[1]];
        let mut k = [0u64; 24];
        for i in 0..self.rounds {
            k[i] = self.k[self.rounds - 1 - i];
        }
        let n = 2 * self.fl_layers;
        let mut ke = [0u64; 8];
        for i in 0..n {
            ke[i] = self.ke[n - 1 - i];
        }
        self.transform(block, &kw, &k[..self.rounds], &ke[..n]);
        Ok(())
    }
}

impl Drop for Camellia {
    fn drop(&mut self) {
        self.kw.zeroize();
        self.k.zeroize();
        self.ke.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // RFC 3713 appendix vectors: same plaintext under all three key sizes.
    #[test]
    fn rfc3713_vectors() {
        let pt = hex!("0123456789abcdeffedcba9876543210");

        let c = Camellia::new(&hex!("0123456789abcdeffedcba9876543210")).unwrap();
        let mut b = pt;
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("67673138549669730857065648eabe43"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, pt);

        let c = Camellia::new(&hex!(
            "0123456789abcdeffedcba98765432100011223344556677"
        ))
        .unwrap();
        let mut b = pt;
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("b4993401b3e996f84ee5cee7d79b09b9"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, pt);

        let c = Camellia::new(&hex!(
            "0123456789abcdeffedcba987654321000112233445566778899aabbccddeeff"
        ))
        .unwrap();
        let mut b = pt;
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("9acc237dff16d76c20ef7c919e3a7509"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, pt);
    }

    #[test]
    fn rejects_bad_key() {
        assert!(Camellia::new(&[0u8; 20]).is_err());
    }
}
