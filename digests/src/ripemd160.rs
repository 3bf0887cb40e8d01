//! RIPEMD-160 (Dobbertin, Bosselaers, Preneel).

use shroud_core::{CryptoError, Digest, Result};
use zeroize::Zeroize;

const BLOCK: usize = 64;
const OUTPUT: usize = 20;

const IV: [u32; 5] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];

const RL: [[usize; 16]; 5] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [7, 4, 13, 1, 10, 6, 15, 3, 12, 0, 9, 5, 2, 14, 11, 8],
    [3, 10, 14, 4, 9, 15, 8, 1, 2, 7, 0, 6, 13, 11, 5, 12],
    [1, 9, 11, 10, 0, 8, 12, 4, 13, 3, 7, 15, 14, 5, 6, 2],
    [4, 0, 5, 9, 7, 12, 2, 10, 14, 1, 3, 8, 11, 6, 15, 13],
];

const RR: [[usize; 16]; 5] = [
    [5, 14, 7, 0, 9, 2, 11, 4, 13, 6, 15, 8, 1, 10, 3, 12],
    [6, 11, 3, 7, 0, 13, 5, 10, 14, 15, 8, 12, 4, 9, 1, 2],
    [15, 5, 1, 3, 7, 14, 6, 9, 11, 8, 12, 2, 10, 0, 4, 13],
    [8, 6, 4, 1, 3, 11, 15, 0, 5, 12, 2, 13, 9, 7, 10, 14],
    [12, 15, 10, 4, 1, 5, 8, 7, 6, 2, 13, 14, 0, 3, 9, 11],
];

const SL: [[u32; 16]; 5] = [
    [11, 14, 15, 12, 5, 8, 7, 9, 11, 13, 14, 15, 6, 7, 9, 8],
    [7, 6, 8, 13, 11, 9, 7, 15, 7, 12, 15, 9, 11, 7, 13, 12],
    [11, 13, 6, 7, 14, 9, 13, 15, 14, 8, 13, 6, 5, 12, 7, 5],
    [11, 12, 14, 15, 14, 15, 9, 8, 9, 14, 5, 6, 8, 6, 5, 12],
    [9, 15, 5, 11, 6, 8, 13, 12, 5, 12, 13, 14, 11, 8, 5, 6],
];

const SR: [[u32; 16]; 5] = [
    [8, 9, 9, 11, 13, 15, 15, 5, 7, 7, 8, 11, 14, 14, 12, 6],
    [9, 13, 15, 7, 12, 8, 9, 11, 7, 7, 12, 7, 6, 15, 13, 11],
    [9, 7, 15, 11, 8, 6, 6, 14, 12, 13, 5, 14, 13, 13, 7, 5],
    [15, 5, 8, 11, 14, 14, 6, 14, 6, 9, 12, 9, 12, 5, 15, 8],
    [8, 5, 12, 9, 12, 5, 14, 6, 8, 13, 6, 5, 15, 13, 11, 11],
];

const KL: [u32; 5] = [0x00000000, 0x5A827999, 0x6ED9EBA1, 0x8F1BBCDC, 0xA953FD4E];
const KR: [u32; 5] = [0x50A28BE6, 0x5C4DD124, 0x6D703EF3, 0x7A6D76E9, 0x00000000];

#[inline]
fn f(j: usize, x: u32, y: u32, z: u32) -> u32 {
    match j / 16 {
        0 => x ^ y ^ z,
        1 => (x & y) | (!x & z),
        2 => (x | !y) ^ z,
        3 => (x & z) | (y & !z),
        _ => x ^ (y | !z),
    }
}

/// RIPEMD-160 streaming state.
pub struct Ripemd160 {
    h: [u32; 5],
    buffer: [u8; BLOCK],
    filled: usize,
    length: u64,
    finished: bool,
}

impl Default for Ripemd160 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ripemd160 {
    /// Fresh state.
    pub fn new() -> Self {
        Ripemd160 {
            h: IV,
            buffer: [0; BLOCK],
            filled: 0,
            length: 0,
            finished: false,
        }
    }

    fn compress(&mut self, block: &[u8; BLOCK]) {
        let mut x = [0u32; 16];
        for i in 0..16 {
            x[i] = u32::from_le_bytes(block[4 * i..4 * i + 4].try_into().unwrap());
        }
        let [mut al, mut bl, mut cl, mut dl, mut el] = self.h;
        let [mut ar, mut br, mut cr, mut dr, mut er] = self.h;
        for j in 0..80 {
            let round = j / 16;
            let t = al
                .wrapping_add(f(j, bl, cl, dl))
                .wrapping_add(x[RL[round][j % 16]])
                .wrapping_add(KL[round])
                .rotate_left(SL[round][j % 16])
                .wrapping_add(el);
            al = el;
            el = dl;
            dl = cl.rotate_left(10);
            cl = bl;
            bl = t;
            let t = ar
                .wrapping_add(f(79 - j, br, cr, dr))
                .wrapping_add(x[RR[round][j % 16]])
                .wrapping_add(KR[round])
                .rotate_left(SR[round][j % 16])
                .wrapping_add(er);
            ar = er;
            er = dr;
            dr = cr.rotate_left(10);
            cr = br;
            br = t;
        }
        let t = self.h[1].wrapping_add(cl).wrapping_add(dr);
        self.h[1] = self.h[2].wrapping_add(dl).wrapping_add(er);
        self.h[2] = self.h[3].wrapping_add(el).wrapping_add(ar);
        self.h[3] = self.h[4].wrapping_add(al).wrapping_add(br);
        self.h[4] = self.h[0].wrapping_add(bl).wrapping_add(cr);
        self.h[0] = t;
    }
}

impl Digest for Ripemd160 {
    fn name(&self) -> &'static str {
        "RIPEMD160"
    }

    fn output_size(&self) -> usize {
        OUTPUT
    }

    fn state_size(&self) -> usize {
        BLOCK
    }

    fn update(&mut self, mut data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        self.length += data.len() as u64;
        if self.filled > 0 {
            let take = (BLOCK - self.filled).min(data.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
            if self.filled == BLOCK {
                let block = self.buffer;
                self.compress(&block);
                self.filled = 0;
            }
        }
        while data.len() >= BLOCK {
            let (block, rest) = data.split_at(BLOCK);
            let owned: [u8; BLOCK] = block.try_into().unwrap();
            self.compress(&owned);
            data = rest;
        }
        if !data.is_empty() {
            self.buffer[..data.len()].copy_from_slice(data);
            self.filled = data.len();
        }
        Ok(())
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        if out.len() < OUTPUT {
            return Err(CryptoError::ShortBuffer);
        }
        let bits = self.length * 8;
        let mut pad = [0u8; BLOCK + 8];
        pad[0] = 0x80;
        let pad_len = if self.filled < 56 { 56 - self.filled } else { 120 - self.filled };
        pad[pad_len..pad_len + 8].copy_from_slice(&bits.to_le_bytes());
        self.update(&pad[..pad_len + 8])?;
        for (i, word) in self.h.iter().enumerate() {
            out[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
        }
        self.finished = true;
        Ok(OUTPUT)
    }

    fn reset(&mut self) {
        self.h = IV;
        self.buffer.zeroize();
        self.filled = 0;
        self.length = 0;
        self.finished = false;
    }
}

impl Drop for Ripemd160 {
    fn drop(&mut self) {
        self.h.zeroize();
        self.buffer.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn digest(data: &[u8]) -> [u8; 20] {
        let mut d = Ripemd160::new();
        d.update(data).unwrap();
        let mut out = [0u8; 20];
        d.finalize_into(&mut out).unwrap();
        out
    }

    #[test]
    fn reference_vectors() {
        assert_eq!(digest(b""), hex!("9c1185a5c5e9fc54612808977ee8f548b2258d31"));
        assert_eq!(digest(b"abc"), hex!("8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"));
        assert_eq!(
            digest(b"abcdefghijklmnopqrstuvwxyz"),
            hex!("f71c27109c692c1b56bbdceb5b9d2865b3708dbc")
        );
    }

    #[test]
    fn reset_reuses_state() {
        let mut d = Ripemd160::new();
        d.update(b"garbage").unwrap();
        let mut out = [0u8; 20];
        d.finalize_into(&mut out).unwrap();
        d.reset();
        d.update(b"abc").unwrap();
        d.finalize_into(&mut out).unwrap();
        assert_eq!(out, hex!("8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"));
    }
}
