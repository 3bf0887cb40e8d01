//! CAST6 / CAST-256 (RFC 2612). 128-bit block, 128..256-bit keys.
//!
//! Shares the CAST5 round functions and S-boxes; the schedule is the
//! RFC 2612 forward-octave construction seeded from sqrt(2)/sqrt(3)
//! constants.

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::cast5::{f1, f2, f3};
use crate::check_block;

const BLOCK_SIZE: usize = 16;
const QUAD_ROUNDS: usize = 12;

/// CAST6 with per-quad-round masking and rotation subkeys.
pub struct Cast6 {
    km: [[u32; 4]; QUAD_ROUNDS],
    kr: [[u32; 4]; QUAD_ROUNDS],
}

impl Cast6 {
    /// Derive subkeys. Keys run 16..=32 bytes in 4-byte steps and are
    /// zero-padded to 256 bits.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() < 16 || key.len() > 32 || key.len() % 4 != 0 {
            return Err(CryptoError::InvalidKeySize);
        }
        let mut padded = [0u8; 32];
        padded[..key.len()].copy_from_slice(key);
        let mut kappa = [0u32; 8];
        for (i, chunk) in padded.chunks_exact(4).enumerate() {
            kappa[i] = u32::from_be_bytes(chunk.try_into().unwrap());
        }

        // Tm/Tr generation, RFC 2612 §2.4
        let mut cm = 0x5A82_7999u32;
        let mm = 0x6ED9_EBA1u32;
        let mut cr = 19u32;
        let mr = 17u32;
        let mut tm = [[0u32; 8]; 24];
        let mut tr = [[0u32; 8]; 24];
        for i in 0..24 {
            for j in 0..8 {
                tm[i][j] = cm;
                cm = cm.wrapping_add(mm);
                tr[i][j] = cr & 31;
                cr = cr.wrapping_add(mr);
            }
        }

        let octave = |i: usize, k: &mut [u32; 8]| {
            k[6] ^= f1(k[7], tm[i][0], tr[i][0]);
            k[5] ^= f2(k[6], tm[i][1], tr[i][1]);
            k[4] ^= f3(k[5], tm[i][2], tr[i][2]);
            k[3] ^= f1(k[4], tm[i][3], tr[i][3]);
            k[2] ^= f2(k[3], tm[i][4], tr[i][4]);
            k[1] ^= f3(k[2], tm[i][5], tr[i][5]);
            k[0] ^= f1(k[1], tm[i][6], tr[i][6]);
            k[7] ^= f2(k[0], tm[i][7], tr[i][7]);
        };

        let mut km = [[0u32; 4]; QUAD_ROUNDS];
        let mut kr = [[0u32; 4]; QUAD_ROUNDS];
        for i in 0..QUAD_ROUNDS {
            octave(2 * i, &mut kappa);
            octave(2 * i + 1, &mut kappa);
            kr[i] = [kappa[0] & 31, kappa[2] & 31, kappa[4] & 31, kappa[6] & 31];
            km[i] = [kappa[7], kappa[5], kappa[3], kappa[1]];
        }
        padded.zeroize();
        kappa.zeroize();
        Ok(Cast6 { km, kr })
    }

    fn quad(&self, i: usize, s: &mut [u32; 4]) {
        s[2] ^= f1(s[3], self.km[i][0], self.kr[i][0]);
        s[1] ^= f2(s[2], self.km[i][1], self.kr[i][1]);
        s[0] ^= f3(s[1], self.km[i][2], self.kr[i][2]);
        s[3] ^= f1(s[0], self.km[i][3], self.kr[i][3]);
    }

    fn quad_bar(&self, i: usize, s: &mut [u32; 4]) {
        s[3] ^= f1(s[0], self.km[i][3], self.kr[i][3]);
        s[0] ^= f3(s[1], self.km[i][2], self.kr[i][2]);
        s[1] ^= f2(s[2], self.km[i][1], self.kr[i][1]);
        s[2] ^= f1(s[3], self.km[i][0], self.kr[i][0]);
    }
}

impl shroud_core::BlockCipher for Cast6 {
    fn name(&self) -> &'static str {
        "CAST6"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut s = [0u32; 4];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            s[i] = u32::from_be_bytes(chunk.try_into().unwrap());
        }
        for i in 0..QUAD_ROUNDS {
            if i < QUAD_ROUNDS / 2 {
                self.quad(i, &mut s);
            } else {
                self.quad_bar(i, &mut s);
            }
        }
        for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&s[i].to_be_bytes());
        }
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut s = [0u32; 4];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            s[i] = u32::from_be_bytes(chunk.try_into().unwrap());
        }
        for i in (0..QUAD_ROUNDS).rev() {
            if i < QUAD_ROUNDS / 2 {
                self.quad_bar(i, &mut s);
            } else {
                self.quad(i, &mut s);
            }
        }
        for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&s[i].to_be_bytes());
        }
        Ok(())
    }
}

impl Drop for Cast6 {
    fn drop(&mut self) {
        for k in self.km.iter_mut() {
            k.zeroize();
        }
        for k in self.kr.iter_mut() {
            k.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // RFC 2612 appendix A.
    #[test]
    fn rfc2612_vectors() {
        let cases: [(&[u8], [u8; 16]); 3] = [
            (
                &hex!("2342bb9efa38542c0af75647f29f615d"),
                hex!("c842a08972b43d20836c91d1b7530f6b"),
            ),
            (
                &hex!("2342bb9efa38542cbed0ac83940ac298bac77a7717942863"),
                hex!("1b386c0210dcadcbdd0e41aa08a7a7e8"),
            ),
            (
                &hex!("2342bb9efa38542cbed0ac83940ac2988d7c47ce264908461cc1b5137ae6b604"),
                hex!("4f6a2038286897b9c9870136553317fa"),
            ),
        ];
        for (key, ct) in cases {
            let c = Cast6::new(key).unwrap();
            let mut b = [0u8; 16];
            c.encrypt_block(&mut b).unwrap();
            assert_eq!(b, ct);
            c.decrypt_block(&mut b).unwrap();
            assert_eq!(b, [0u8; 16]);
        }
    }

    #[test]
    fn key_size_limits() {
        assert!(Cast6::new(&[0u8; 15]).is_err());
        assert!(Cast6::new(&[0u8; 33]).is_err());
        assert!(Cast6::new(&[0u8; 20]).is_ok());
    }
}
