//! Twofish. 128-bit block, 128/192/256-bit keys.
//!
//! The q permutations are table data; the MDS and RS matrix
//! arithmetic over GF(2^8) runs at key-setup time.

mod tables;

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

use crate::check_block;
use tables::{Q0, Q1};

const BLOCK_SIZE: usize = 16;
const ROUNDS: usize = 16;

const MDS_POLY: u16 = 0x169; // x^8 + x^6 + x^5 + x^3 + 1
const RS_POLY: u16 = 0x14d; // x^8 + x^6 + x^3 + x^2 + 1

const MDS: [[u8; 4]; 4] = [
    [0x01, 0xEF, 0x5B, 0x5B],
    [0x5B, 0xEF, 0xEF, 0x01],
    [0xEF, 0x5B, 0x01, 0xEF],
    [0xEF, 0x01, 0xEF, 0x5B],
];

const RS: [[u8; 8]; 4] = [
    [0x01, 0xA4, 0x55, 0x87, 0x5A, 0x58, 0xDB, 0x9E],
    [0xA4, 0x56, 0x82, 0xF3, 0x1E, 0xC6, 0x68, 0xE5],
    [0x02, 0xA1, 0xFC, 0xC1, 0x47, 0xAE, 0x3D, 0x19],
    [0xA4, 0x55, 0x87, 0x5A, 0x58, 0xDB, 0x9E, 0x03],
];

fn gmul(a: u8, b: u8, poly: u16) -> u8 {
    let mut p = 0u16;
    for i in 0..8 {
        if (b >> i) & 1 != 0 {
            p ^= u16::from(a) << i;
        }
    }
    for i in (8..16).rev() {
        if (p >> i) & 1 != 0 {
            p ^= poly << (i - 8);
        }
    }
    p as u8
}

fn mds_column(y: [u8; 4]) -> u32 {
    let mut z = [0u8; 4];
    for (i, row) in MDS.iter().enumerate() {
        let mut v = 0u8;
        for j in 0..4 {
            v ^= gmul(y[j], row[j], MDS_POLY);
        }
        z[i] = v;
    }
    u32::from_le_bytes(z)
}

/// The h function: q-box chain keyed by `l`, then the MDS matrix.
fn h(x: u32, l: &[u32], k: usize) -> u32 {
    let mut b = x.to_le_bytes();
    if k == 4 {
        b = [
            Q1[b[0] as usize] ^ l[3].to_le_bytes()[0],
            Q0[b[1] as usize] ^ l[3].to_le_bytes()[1],
            Q0[b[2] as usize] ^ l[3].to_le_bytes()[2],
            Q1[b[3] as usize] ^ l[3].to_le_bytes()[3],
        ];
    }
    if k >= 3 {
        b = [
            Q1[b[0] as usize] ^ l[2].to_le_bytes()[0],
            Q1[b[1] as usize] ^ l[2].to_le_bytes()[1],
            Q0[b[2] as usize] ^ l[2].to_le_bytes()[2],
            Q0[b[3] as usize] ^ l[2].to_le_bytes()[3],
        ];
    }
    b = [
        Q0[b[0] as usize] ^ l[1].to_le_bytes()[0],
        Q1[b[1] as usize] ^ l[1].to_le_bytes()[1],
        Q0[b[2] as usize] ^ l[1].to_le_bytes()[2],
        Q1[b[3] as usize] ^ l[1].to_le_bytes()[3],
    ];
    b = [
        Q0[b[0] as usize] ^ l[0].to_le_bytes()[0],
        Q0[b[1] as usize] ^ l[0].to_le_bytes()[1],
        Q1[b[2] as usize] ^ l[0].to_le_bytes()[2],
        Q1[b[3] as usize] ^ l[0].to_le_bytes()[3],
    ];
    mds_column([
        Q1[b[0] as usize],
        Q0[b[1] as usize],
        Q1[b[2] as usize],
        Q0[b[3] as usize],
    ])
}

/// Twofish with expanded round keys and the RS-derived S vector.
pub struct Twofish {
    k: [u32; 40],
    s: [u32; 4],
    words: usize,
}

impl Twofish {
    /// Accepts 16, 24 or 32-byte keys.
    pub fn new(key: &[u8]) -> Result<Self> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeySize);
        }
        let kw = key.len() / 8;
        let mut me = [0u32; 4];
        let mut mo = [0u32; 4];
        for i in 0..kw {
            me[i] = u32::from_le_bytes(key[8 * i..8 * i + 4].try_into().unwrap());
            mo[i] = u32::from_le_bytes(key[8 * i + 4..8 * i + 8].try_into().unwrap());
        }
        // S vector: RS code over each 8-byte key chunk, used in
        // reverse order by h
        let mut s = [0u32; 4];
        for i in 0..kw {
            let chunk = &key[8 * i..8 * i + 8];
            let mut sv = [0u8; 4];
            for (r, row) in RS.iter().enumerate() {
                let mut v = 0u8;
                for c in 0..8 {
                    v ^= gmul(chunk[c], row[c], RS_POLY);
                }
                sv[r] = v;
            }
            s[kw - 1 - i] = u32::from_le_bytes(sv);
        }
        let rho = 0x0101_0101u32;
        let mut k = [0u32; 40];
        for i in 0..20 {
            let a = h((2 * i as u32).wrapping_mul(rho), &me, kw);
            let b = h((2 * i as u32 + 1).wrapping_mul(rho), &mo, kw).rotate_left(8);
            k[2 * i] = a.wrapping_add(b);
            k[2 * i + 1] = a.wrapping_add(b.wrapping_mul(2)).rotate_left(9);
        }
        me.zeroize();
        mo.zeroize();
        Ok(Twofish { k, s, words: kw })
    }

    #[inline]
    fn g(&self, x: u32) -> u32 {
        h(x, &self.s, self.words)
    }
}

impl shroud_core::BlockCipher for Twofish {
    fn name(&self) -> &'static str {
        "Twofish"
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut r = [0u32; 4];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            r[i] = u32::from_le_bytes(chunk.try_into().unwrap()) ^ self.k[i];
        }
        for round in 0..ROUNDS {
            let t0 = self.g(r[0]);
            let t1 = self.g(r[1].rotate_left(8));
            let f0 = t0.wrapping_add(t1).wrapping_add(self.k[8 + 2 * round]);
            let f1 = t0
                .wrapping_add(t1.wrapping_mul(2))
                .wrapping_add(self.k[9 + 2 * round]);
            let r2 = (r[2] ^ f0).rotate_right(1);
            let r3 = r[3].rotate_left(1) ^ f1;
            r = [r2, r3, r[0], r[1]];
        }
        let r = [r[2], r[3], r[0], r[1]];
        for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&(r[i] ^ self.k[4 + i]).to_le_bytes());
        }
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        check_block(block, BLOCK_SIZE)?;
        let mut r = [0u32; 4];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            r[i] = u32::from_le_bytes(chunk.try_into().unwrap()) ^ self.k[4 + i];
        }
        for round in (0..ROUNDS).rev() {
            let t0 = self.g(r[0]);
            let t1 = self.g(r[1].rotate_left(8));
            let f0 = t0.wrapping_add(t1).wrapping_add(self.k[8 + 2 * round]);
            let f1 = t0
                .wrapping_add(t1.wrapping_mul(2))
                .wrapping_add(self.k[9 + 2 * round]);
            let r2 = r[2].rotate_left(1) ^ f0;
            let r3 = (r[3] ^ f1).rotate_right(1);
            r = [r2, r3, r[0], r[1]];
        }
        let r = [r[2], r[3], r[0], r[1]];
        for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&(r[i] ^ self.k[i]).to_le_bytes());
        }
        Ok(())
    }
}

impl Drop for Twofish {
    fn drop(&mut self) {
        self.k.zeroize();
        self.s.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_core::BlockCipher;

    // Vectors from the Twofish paper.
    #[test]
    fn paper_vectors() {
        let c = Twofish::new(&[0u8; 16]).unwrap();
        let mut b = [0u8; 16];
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("9f589f5cf6122c32b6bfec2f2ae8c35a"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, [0u8; 16]);

        let c = Twofish::new(&hex!(
            "0123456789abcdeffedcba98765432100011223344556677"
        ))
        .unwrap();
        let mut b = [0u8; 16];
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("cfd1d2e5a9be9cdf501f13b892bd2248"));

        let c = Twofish::new(&hex!(
            "0123456789abcdeffedcba987654321000112233445566778899aabbccddeeff"
        ))
        .unwrap();
        let mut b = [0u8; 16];
        c.encrypt_block(&mut b).unwrap();
        assert_eq!(b, hex!("37527be0052334b89f0cfccae87cfa20"));
        c.decrypt_block(&mut b).unwrap();
        assert_eq!(b, [0u8; 16]);
    }
}
