//! Blowfish (Schneier, 1993). 64-bit block, 32..448-bit keys.

mod tables;

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;
use tables::{P_INIT, S0_INIT, S1_INIT, S2_INIT, S3_INIT};

const BLOCK_SIZE: usize = 8;
const ROUNDS: usize = 16;

/// Blowfish with key-mixed P-array and S-boxes.
pub struct Blowfish {
    p: [u32; 18],
    s: [[u32; 256]; 4],
}

impl Blowfish {
    /// Derive the key-dependent tables. Keys run 4..=56 bytes in
    /// whole-byte steps (32..448 bits).
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() < 4 || key.len() > 56 {
            return Err(CryptoError::InvalidKeySize);
        }
        let mut bf = Blowfish {
            p: P_INIT,
            s: [S0_INIT, S1_INIT, S2_INIT, S3_INIT],
        };
        let mut j = 0;
        for p in bf.p.iter_mut() {
            let mut d = 0u32;
            for _ in 0..4 {
                d = (d << 8) | u32::from(key[j % key.len()]);
                j += 1;
            }
            *p ^= d;
        }
        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..18).step_by(2) {
            let (nl, nr) = bf.encrypt_words(l, r);
            l = nl;
            r = nr;
            bf.p[i] = l;
            bf.p[i + 1] = r;
        }
        for b in 0..4 {
            for i in (0..256).step_by(2) {
                let (nl, nr) = bf.encrypt_words(l, r);
                l = nl;
                r = nr;
                bf.s[b][i] = l;
                bf.s[b][i + 1] = r;
            }
        }
        Ok(bf)
    }

    #[inline]
    fn f(&self, x: u32) -> u32 {
        let a = self.s[0][(x >> 24) as usize];
        let b = self.s[1][((x >> 16) & 0xff) as usize];
        let c = self.s[2][((x >> 8) & 0xff) as usize];
        let d = self.s[3][(x & 0xff) as usize];
        (a.wrapping_add(b) ^ c).wrapping_add(d)
    }

    fn encrypt_words(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in 0..ROUNDS {
            l ^= self.p[i];
            r ^= self.f(l);
            core::mem::swap(&mut l, &mut r);
        }
        core::mem::swap(&mut l, &mut r);
        r ^= self.p[16];
        l ^= self.p[17];
        (l, r)
    }

    fn decrypt_words(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in (2..18).rev() {
            l ^= self.p[i];
            r ^= self.f(l);
            core::mem::swap(&mut l, &mut r);
        }
        core::mem::swap(&mut l, &mut r);
        r ^= self.p[1];
        l ^= self.p[0];
        (l, r)
    }
}

impl shroud_core::BlockCipher for Blowfish {
    fn name(&self) -> &'static str {
        "Blowfish"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let l = u32::from_be_bytes(block[..4].try_into().unwrap());
        let r = u32::from_be_bytes(block[4..].try_into().unwrap());
        let (l, r) = self.encrypt_words(l, r);
        block[..4].copy_from_slice(&l.to_be_bytes());
        block[4..].copy_from_slice(&r.to_be_bytes());
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let l = u32::from_be_bytes(block[..4].try_into().unwrap());
        let r = u32::from_be_bytes(block[4..].try_into().unwrap());
        let (l, r) = self.decrypt_words(l, r);
        block[..4].copy_from_slice(&l.to_be_bytes());
        block[4..].copy_from_slice(&r.to_be_bytes());
        Ok(())
    }
}

impl Drop for Blowfish {
    fn drop(&mut self) {
        self.p.zeroize();
        for s in self.s.iter_mut() {
            s.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // Schneier's reference vectors.
    #[test]
    fn reference_vectors() {
        let cases: [([u8; 8], [u8; 8], [u8; 8]); 3] = [
            (hex!("0000000000000000"), hex!("0000000000000000"), hex!("4ef997456198dd78")),
            (hex!("ffffffffffffffff"), hex!("ffffffffffffffff"), hex!("51866fd5b85ecb8a")),
            (hex!("3000000000000000"), hex!("1000000000000001"), hex!("7d856f9a613063f2")),
        ];
        for (key, pt, ct) in cases {
            let bf = Blowfish::new(&key).unwrap();
            let mut block = pt;
            bf.encrypt_block(&mut block).unwrap();
            assert_eq!(block, ct);
            bf.decrypt_block(&mut block).unwrap();
            assert_eq!(block, pt);
        }
    }

    #[test]
    fn short_key_cycles() {
        // 56-bit key, cycled over the P-array like the reference code
        let bf = Blowfish::new(&hex!("fedcba9876543210")[..7]).unwrap();
        let mut block = hex!("0123456789abcdef");
        bf.encrypt_block(&mut block).unwrap();
        let ct = block;
        bf.decrypt_block(&mut block).unwrap();
        assert_eq!(block, hex!("0123456789abcdef"));
        assert_ne!(ct, hex!("0123456789abcdef"));
    }

    #[test]
    fn key_size_limits() {
        assert!(Blowfish::new(&[0u8; 3]).is_err());
        assert!(Blowfish::new(&[0u8; 57]).is_err());
        assert!(Blowfish::new(&[0u8; 4]).is_ok());
        assert!(Blowfish::new(&[0u8; 56]).is_ok());
    }
}
