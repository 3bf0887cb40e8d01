//! Whirlpool (Barreto, Rijmen). 512-bit digest, Miyaguchi–Preneel
//! compression over an 8x8 byte state.
//!
//! The S-box is generated from the specification's 4-bit mini-boxes
//! and the circulant diffusion tables from the [1,1,4,1,8,5,2,9] row
//! over GF(2^8), all at compile time.

use shroud_core::{CryptoError, Digest, Result};
use zeroize::Zeroize;

const BLOCK: usize = 64;
const OUTPUT: usize = 64;
const ROUNDS: usize = 10;

/// The E mini-box; R is the pseudo-random involution.
const E: [u8; 16] = [
    0x1, 0xB, 0x9, 0xC, 0xD, 0x6, 0xF, 0x3, 0xE, 0x8, 0x7, 0x4, 0xA, 0x2, 0x5, 0x0,
];
const R: [u8; 16] = [
    0x7, 0xC, 0xB, 0xD, 0xE, 0x4, 0x9, 0xF, 0x6, 0x3, 0x8, 0xA, 0x2, 0x5, 0x1, 0x0,
];

const fn e_inv() -> [u8; 16] {
    let mut inv = [0u8; 16];
    let mut i = 0;
    while i < 16 {
        inv[E[i] as usize] = i as u8;
        i += 1;
    }
    inv
}

const fn build_sbox() -> [u8; 256] {
    let einv = e_inv();
    let mut s = [0u8; 256];
    let mut x = 0;
    while x < 256 {
        let a = E[x >> 4];
        let b = einv[x & 0xf];
        let r = R[(a ^ b) as usize];
        s[x] = (E[(a ^ r) as usize] << 4) | einv[(b ^ r) as usize];
        x += 1;
    }
    s
}

const SBOX: [u8; 256] = build_sbox();

/// GF(2^8) multiply modulo x^8 + x^4 + x^3 + x^2 + 1.
const fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    let mut i = 0;
    while i < 8 {
        if b & 1 != 0 {
            p ^= a;
        }
        let hi = a & 0x80;
        a <<= 1;
        if hi != 0 {
            a ^= 0x1d;
        }
        b >>= 1;
        i += 1;
    }
    p
}

const fn build_c0() -> [u64; 256] {
    const COEF: [u8; 8] = [1, 1, 4, 1, 8, 5, 2, 9];
    let mut t = [0u64; 256];
    let mut x = 0;
    while x < 256 {
        let s = SBOX[x];
        let mut v = 0u64;
        let mut i = 0;
        while i < 8 {
            v |= (gmul(s, COEF[i]) as u64) << (56 - 8 * i);
            i += 1;
        }
        t[x] = v;
        x += 1;
    }
    t
}

const C0: [u64; 256] = build_c0();

const fn build_rc() -> [u64; ROUNDS] {
    let mut rc = [0u64; ROUNDS];
    let mut r = 0;
    while r < ROUNDS {
        let mut v = 0u64;
        let mut i = 0;
        while i < 8 {
            v |= (SBOX[8 * r + i] as u64) << (56 - 8 * i);
            i += 1;
        }
        rc[r] = v;
        r += 1;
    }
    rc
}

const RC: [u64; ROUNDS] = build_rc();

/// One theta-gamma-pi-tau layer over the eight state rows.
fn transform(input: &[u64; 8], round_key: &[u64; 8]) -> [u64; 8] {
    let mut out = [0u64; 8];
    for i in 0..8 {
        let mut v = 0u64;
        for t in 0..8 {
            let byte = (input[(i + 8 - t) % 8] >> (56 - 8 * t)) & 0xff;
            v ^= C0[byte as usize].rotate_right(8 * t as u32);
        }
        out[i] = v ^ round_key[i];
    }
    out
}

/// Whirlpool streaming state.
pub struct Whirlpool {
    h: [u64; 8],
    buffer: [u8; BLOCK],
    filled: usize,
    /// Message length in bytes; the spec allows a 256-bit counter but
    /// a u128 covers anything this implementation can be fed.
    length: u128,
    finished: bool,
}

impl Default for Whirlpool {
    fn default() -> Self {
        Self::new()
    }
}

impl Whirlpool {
    /// Fresh state.
    pub fn new() -> Self {
        Whirlpool {
            h: [0; 8],
            buffer: [0; BLOCK],
            filled: 0,
            length: 0,
            finished: false,
        }
    }

    fn compress(&mut self, block: &[u8; BLOCK]) {
        let mut m = [0u64; 8];
        for i in 0..8 {
            m[i] = u64::from_be_bytes(block[8 * i..8 * i + 8].try_into().unwrap());
        }
        let mut k = self.h;
        let mut st = [0u64; 8];
        for i in 0..8 {
            st[i] = m[i] ^ k[i];
        }
        for r in 0..ROUNDS {
            let mut rk = [0u64; 8];
            rk[0] = RC[r];
            k = transform(&k, &rk);
            st = transform(&st, &k);
        }
        for i in 0..8 {
            self.h[i] ^= st[i] ^ m[i];
        }
    }
}

impl Digest for Whirlpool {
    fn name(&self) -> &'static str {
        "Whirlpool"
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
        self.length += data.len() as u128;
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
        // pad to 32 mod 64, then a 256-bit big-endian bit count
        let bits = self.length * 8;
        let mut pad = [0u8; 2 * BLOCK];
        pad[0] = 0x80;
        let pad_len = if self.filled < 32 { 32 - self.filled } else { 96 - self.filled };
        let mut counter = [0u8; 32];
        counter[16..].copy_from_slice(&bits.to_be_bytes());
        pad[pad_len..pad_len + 32].copy_from_slice(&counter);
        self.update(&pad[..pad_len + 32])?;
        for (i, word) in self.h.iter().enumerate() {
            out[8 * i..8 * i + 8].copy_from_slice(&word.to_be_bytes());
        }
        self.finished = true;
        Ok(OUTPUT)
    }

    fn reset(&mut self) {
        self.h = [0; 8];
        self.buffer.zeroize();
        self.filled = 0;
        self.length = 0;
        self.finished = false;
    }
}

impl Drop for Whirlpool {
    fn drop(&mut self) {
        self.h.zeroize();
        self.buffer.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn digest(data: &[u8]) -> [u8; 64] {
        let mut d = Whirlpool::new();
        d.update(data).unwrap();
        let mut out = [0u8; 64];
        d.finalize_into(&mut out).unwrap();
        out
    }

    #[test]
    fn sbox_generation() {
        assert_eq!(&SBOX[..8], &[0x18, 0x23, 0xc6, 0xe8, 0x87, 0xb8, 0x01, 0x4f]);
        assert_eq!(RC[0], 0x1823c6e887b8014f);
    }

    // ISO test vectors.
    #[test]
    fn reference_vectors() {
        assert_eq!(
            digest(b""),
            hex!(
                "19fa61d75522a4669b44e39c1d2e1726c530232130d407f89afee0964997f7a7"
                "3e83be698b288febcf88e3e03c4f0757ea8964e59b63d93708b138cc42a66eb3"
            )
        );
        assert_eq!(
            digest(b"abc"),
            hex!(
                "4e2448a4c6f486bb16b6562c73b4020bf3043e3a731bce721ae1b303d97e6d4c"
                "7181eebdb6c57e277d0e34957114cbd6c797fc9d95d8b582d225292076d4eef5"
            )
        );
    }

    #[test]
    fn spans_length_branch() {
        for n in [31usize, 32, 33, 64, 65] {
            let data = vec![0x11u8; n];
            let mut d = Whirlpool::new();
            for c in data.chunks(9) {
                d.update(c).unwrap();
            }
            let mut a = [0u8; 64];
            d.finalize_into(&mut a).unwrap();
            assert_eq!(a, digest(&data));
        }
    }
}
