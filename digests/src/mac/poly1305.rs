//! Poly1305 (Bernstein) over GF(2^130 - 5).
//!
//! The plain form takes a 32-byte key: `r` is the clamped first half,
//! `s` the second. The cipher-bound form keys a 128-bit block cipher
//! with the second half and encrypts a 16-byte nonce to obtain `s`.

use shroud_core::{BlockCipher, CryptoError, Mac, Result};
use zeroize::Zeroize;

const BLOCK: usize = 16;
const CLAMP: [u8; 16] = [
    0xff, 0xff, 0xff, 0x0f, 0xfc, 0xff, 0xff, 0x0f, 0xfc, 0xff, 0xff, 0x0f, 0xfc, 0xff, 0xff,
    0x0f,
];

/// Poly1305 accumulator in 26-bit limbs.
pub struct Poly1305 {
    r: [u32; 5],
    s: [u8; 16],
    h: [u32; 5],
    buffer: [u8; BLOCK],
    filled: usize,
}

impl Poly1305 {
    /// RFC-style keying: 32-byte key, `s = key[16..32]`.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(CryptoError::InvalidKeySize);
        }
        Ok(Self::from_parts(
            key[..16].try_into().unwrap(),
            key[16..].try_into().unwrap(),
        ))
    }

    /// Cipher-bound keying: `s = E_{key[16..32]}(nonce)` under the
    /// supplied 128-bit block cipher construction.
    pub fn with_cipher<C, F>(key: &[u8], nonce: &[u8], build: F) -> Result<Self>
    where
        C: BlockCipher,
        F: FnOnce(&[u8]) -> Result<C>,
    {
        if key.len() != 32 {
            return Err(CryptoError::InvalidKeySize);
        }
        if nonce.len() != BLOCK {
            return Err(CryptoError::InvalidIvSize);
        }
        let cipher = build(&key[16..])?;
        if cipher.block_size() != BLOCK {
            return Err(CryptoError::InvalidBlockSize);
        }
        let mut s: [u8; 16] = nonce.try_into().unwrap();
        cipher.encrypt_block(&mut s)?;
        Ok(Self::from_parts(key[..16].try_into().unwrap(), s))
    }

    fn from_parts(mut r_bytes: [u8; 16], s: [u8; 16]) -> Self {
        for (b, m) in r_bytes.iter_mut().zip(CLAMP) {
            *b &= m;
        }
        let r = [
            u32::from_le_bytes(r_bytes[0..4].try_into().unwrap()) & 0x3ffffff,
            (u32::from_le_bytes(r_bytes[3..7].try_into().unwrap()) >> 2) & 0x3ffffff,
            (u32::from_le_bytes(r_bytes[6..10].try_into().unwrap()) >> 4) & 0x3ffffff,
            (u32::from_le_bytes(r_bytes[9..13].try_into().unwrap()) >> 6) & 0x3ffffff,
            (u32::from_le_bytes(r_bytes[12..16].try_into().unwrap()) >> 8) & 0x3ffffff,
        ];
        r_bytes.zeroize();
        Poly1305 {
            r,
            s,
            h: [0; 5],
            buffer: [0; BLOCK],
            filled: 0,
        }
    }

    /// Absorb one 17-byte-extended block (the high bit set for full
    /// blocks, inside the padding byte for the last).
    fn process_block(&mut self, block: &[u8; BLOCK], hibit: u32) {
        let h = &mut self.h;
        h[0] += u32::from_le_bytes(block[0..4].try_into().unwrap()) & 0x3ffffff;
        h[1] += (u32::from_le_bytes(block[3..7].try_into().unwrap()) >> 2) & 0x3ffffff;
        h[2] += (u32::from_le_bytes(block[6..10].try_into().unwrap()) >> 4) & 0x3ffffff;
        h[3] += (u32::from_le_bytes(block[9..13].try_into().unwrap()) >> 6) & 0x3ffffff;
        h[4] += (u32::from_le_bytes(block[12..16].try_into().unwrap()) >> 8) | (hibit << 24);

        let [r0, r1, r2, r3, r4] = self.r.map(u64::from);
        let (s1, s2, s3, s4) = (r1 * 5, r2 * 5, r3 * 5, r4 * 5);
        let [h0, h1, h2, h3, h4] = h.map(u64::from);

        let d0 = h0 * r0 + h1 * s4 + h2 * s3 + h3 * s2 + h4 * s1;
        let d1 = h0 * r1 + h1 * r0 + h2 * s4 + h3 * s3 + h4 * s2;
        let d2 = h0 * r2 + h1 * r1 + h2 * r0 + h3 * s4 + h4 * s3;
        let d3 = h0 * r3 + h1 * r2 + h2 * r1 + h3 * r0 + h4 * s4;
        let d4 = h0 * r4 + h1 * r3 + h2 * r2 + h3 * r1 + h4 * r0;

        let mut c = d0 >> 26;
        h[0] = (d0 & 0x3ffffff) as u32;
        let d1 = d1 + c;
        c = d1 >> 26;
        h[1] = (d1 & 0x3ffffff) as u32;
        let d2 = d2 + c;
        c = d2 >> 26;
        h[2] = (d2 & 0x3ffffff) as u32;
        let d3 = d3 + c;
        c = d3 >> 26;
        h[3] = (d3 & 0x3ffffff) as u32;
        let d4 = d4 + c;
        c = d4 >> 26;
        h[4] = (d4 & 0x3ffffff) as u32;
        h[0] += (c * 5) as u32;
        let c2 = h[0] >> 26;
        h[0] &= 0x3ffffff;
        h[1] += c2;
    }
}

impl Mac for Poly1305 {
    fn name(&self) -> &'static str {
        "Poly1305"
    }

    fn output_size(&self) -> usize {
        BLOCK
    }

    fn state_size(&self) -> usize {
        BLOCK
    }

    fn update(&mut self, mut data: &[u8]) -> Result<()> {
        if self.filled > 0 {
            let take = (BLOCK - self.filled).min(data.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
            if self.filled == BLOCK {
                let block = self.buffer;
                self.process_block(&block, 1);
                self.filled = 0;
            }
        }
        while data.len() >= BLOCK {
            let block: [u8; BLOCK] = data[..BLOCK].try_into().unwrap();
            self.process_block(&block, 1);
            data = &data[BLOCK..];
        }
        if !data.is_empty() {
            self.buffer[..data.len()].copy_from_slice(data);
            self.filled = data.len();
        }
        Ok(())
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.len() < BLOCK {
            return Err(CryptoError::ShortBuffer);
        }
        if self.filled > 0 {
            let mut block = [0u8; BLOCK];
            block[..self.filled].copy_from_slice(&self.buffer[..self.filled]);
            block[self.filled] = 1;
            self.process_block(&block, 0);
        }
        // full carry, then reduce modulo 2^130 - 5 once
        let mut h = self.h.map(u64::from);
        let mut c;
        for i in 1..5 {
            c = h[i - 1] >> 26;
            h[i - 1] &= 0x3ffffff;
            h[i] += c;
        }
        c = h[4] >> 26;
        h[4] &= 0x3ffffff;
        h[0] += c * 5;
        c = h[0] >> 26;
        h[0] &= 0x3ffffff;
        h[1] += c;

        // compare against p by trial subtraction
        let mut g = [0u64; 5];
        let mut borrow = 0u64;
        let p = [0x3fffffb_u64, 0x3ffffff, 0x3ffffff, 0x3ffffff, 0x3ffffff];
        for i in 0..5 {
            let (v, b) = h[i].overflowing_sub(p[i] + borrow);
            g[i] = v & 0x3ffffff;
            borrow = u64::from(b);
        }
        let sel = if borrow == 0 { g } else { h };

        // assemble 128 bits little-endian from the 26-bit limbs
        let lo = sel[0] | (sel[1] << 26) | (sel[2] << 52);
        let hi = (sel[2] >> 12) | (sel[3] << 14) | (sel[4] << 40);
        let mut tag = [0u8; 16];
        tag[..8].copy_from_slice(&lo.to_le_bytes());
        tag[8..].copy_from_slice(&hi.to_le_bytes());
        // add s modulo 2^128
        let mut carry = 0u16;
        for i in 0..16 {
            let v = u16::from(tag[i]) + u16::from(self.s[i]) + carry;
            tag[i] = v as u8;
            carry = v >> 8;
        }
        out[..BLOCK].copy_from_slice(&tag);
        tag.zeroize();
        self.reset();
        Ok(BLOCK)
    }

    fn reset(&mut self) {
        self.h.zeroize();
        self.buffer.zeroize();
        self.filled = 0;
    }
}

impl Drop for Poly1305 {
    fn drop(&mut self) {
        self.r.zeroize();
        self.s.zeroize();
        self.h.zeroize();
        self.buffer.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 8439 2.5.2.
    #[test]
    fn rfc8439_vector() {
        let key = hex!(
            "85d6be7857556d337f4452fe42d506a80103808afb0db2fd4abff6af4149f51b"
        );
        let mut mac = Poly1305::new(&key).unwrap();
        mac.update(b"Cryptographic Forum Research Group").unwrap();
        let mut tag = [0u8; 16];
        mac.finalize_into(&mut tag).unwrap();
        assert_eq!(tag, hex!("a8061dc1305136c6c22b8baf0c0127a9"));
    }

    #[test]
    fn chunked_equals_one_shot() {
        let key = [0x42u8; 32];
        let msg: Vec<u8> = (0..77).collect();
        let mut a = Poly1305::new(&key).unwrap();
        a.update(&msg).unwrap();
        let mut ta = [0u8; 16];
        a.finalize_into(&mut ta).unwrap();
        let mut b = Poly1305::new(&key).unwrap();
        for c in msg.chunks(5) {
            b.update(c).unwrap();
        }
        let mut tb = [0u8; 16];
        b.finalize_into(&mut tb).unwrap();
        assert_eq!(ta, tb);
    }

    #[test]
    fn finalize_resets() {
        let key = [0x24u8; 32];
        let mut mac = Poly1305::new(&key).unwrap();
        mac.update(b"first").unwrap();
        let mut a = [0u8; 16];
        mac.finalize_into(&mut a).unwrap();
        mac.update(b"first").unwrap();
        let mut b = [0u8; 16];
        mac.finalize_into(&mut b).unwrap();
        assert_eq!(a, b);
    }
}
