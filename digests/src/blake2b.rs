//! BLAKE2b (RFC 7693), with the full parameter block: digest length,
//! key, 16-byte salt and 16-byte personalization.

use shroud_core::{CryptoError, Digest, Result};
use zeroize::Zeroize;

const BLOCK: usize = 128;
pub(crate) const IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

const SIGMA: [[usize; 16]; 12] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
    [11, 8, 12, 0, 5, 2, 15, 13, 10, 14, 3, 6, 7, 1, 9, 4],
    [7, 9, 3, 1, 13, 12, 11, 14, 2, 6, 5, 10, 4, 0, 15, 8],
    [9, 0, 5, 7, 2, 4, 10, 15, 14, 1, 11, 12, 6, 8, 3, 13],
    [2, 12, 6, 10, 0, 11, 8, 3, 4, 13, 7, 5, 15, 14, 1, 9],
    [12, 5, 1, 15, 14, 13, 4, 10, 0, 7, 6, 3, 9, 2, 8, 11],
    [13, 11, 7, 14, 12, 1, 3, 9, 5, 0, 15, 4, 8, 6, 2, 10],
    [6, 15, 14, 9, 11, 3, 0, 8, 12, 2, 13, 7, 1, 4, 10, 5],
    [10, 2, 8, 4, 7, 6, 1, 5, 15, 11, 9, 14, 3, 12, 13, 0],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [14, 10, 4, 8, 9, 15, 13, 6, 1, 12, 0, 2, 11, 7, 5, 3],
];

/// Twelve-round compression, shared with the keyed MAC wrapper.
pub(crate) fn compress(h: &mut [u64; 8], block: &[u8; BLOCK], t: u128, last: bool) {
    let mut m = [0u64; 16];
    for i in 0..16 {
        m[i] = u64::from_le_bytes(block[8 * i..8 * i + 8].try_into().unwrap());
    }
    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV);
    v[12] ^= t as u64;
    v[13] ^= (t >> 64) as u64;
    if last {
        v[14] ^= u64::MAX;
    }
    macro_rules! g {
        ($a:expr, $b:expr, $c:expr, $d:expr, $x:expr, $y:expr) => {
            v[$a] = v[$a].wrapping_add(v[$b]).wrapping_add($x);
            v[$d] = (v[$d] ^ v[$a]).rotate_right(32);
            v[$c] = v[$c].wrapping_add(v[$d]);
            v[$b] = (v[$b] ^ v[$c]).rotate_right(24);
            v[$a] = v[$a].wrapping_add(v[$b]).wrapping_add($y);
            v[$d] = (v[$d] ^ v[$a]).rotate_right(16);
            v[$c] = v[$c].wrapping_add(v[$d]);
            v[$b] = (v[$b] ^ v[$c]).rotate_right(63);
        };
    }
    for s in &SIGMA {
        g!(0, 4, 8, 12, m[s[0]], m[s[1]]);
        g!(1, 5, 9, 13, m[s[2]], m[s[3]]);
        g!(2, 6, 10, 14, m[s[4]], m[s[5]]);
        g!(3, 7, 11, 15, m[s[6]], m[s[7]]);
        g!(0, 5, 10, 15, m[s[8]], m[s[9]]);
        g!(1, 6, 11, 12, m[s[10]], m[s[11]]);
        g!(2, 7, 8, 13, m[s[12]], m[s[13]]);
        g!(3, 4, 9, 14, m[s[14]], m[s[15]]);
    }
    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

/// BLAKE2b with a configurable output size, optional key, salt and
/// personalization.
pub struct Blake2b {
    h: [u64; 8],
    h0: [u64; 8],
    buffer: [u8; BLOCK],
    filled: usize,
    counter: u128,
    output_size: usize,
    key_block: Option<Box<[u8; BLOCK]>>,
    finished: bool,
}

impl Blake2b {
    /// Unkeyed instance producing `output_size` bytes (1..=64).
    pub fn new(output_size: usize) -> Result<Self> {
        Self::with_params(output_size, &[], &[], &[])
    }

    /// Keyed/salted/personalized instance. The key may be up to 64
    /// bytes, salt and personalization up to 16 each.
    pub fn with_params(
        output_size: usize,
        key: &[u8],
        salt: &[u8],
        personal: &[u8],
    ) -> Result<Self> {
        if output_size == 0 || output_size > 64 {
            return Err(CryptoError::ArgumentInvalid("blake2b output size"));
        }
        if key.len() > 64 {
            return Err(CryptoError::InvalidKeySize);
        }
        if salt.len() > 16 || personal.len() > 16 {
            return Err(CryptoError::ArgumentInvalid("blake2b salt/personal"));
        }
        // parameter block: out length, key length, fanout 1, depth 1,
        // salt at 32, personalization at 48
        let mut p = [0u8; 64];
        p[0] = output_size as u8;
        p[1] = key.len() as u8;
        p[2] = 1;
        p[3] = 1;
        p[32..32 + salt.len()].copy_from_slice(salt);
        p[48..48 + personal.len()].copy_from_slice(personal);
        let mut h = IV;
        for (i, chunk) in p.chunks_exact(8).enumerate() {
            h[i] ^= u64::from_le_bytes(chunk.try_into().unwrap());
        }
        let key_block = if key.is_empty() {
            None
        } else {
            let mut kb = Box::new([0u8; BLOCK]);
            kb[..key.len()].copy_from_slice(key);
            Some(kb)
        };
        let mut d = Blake2b {
            h,
            h0: h,
            buffer: [0; BLOCK],
            filled: 0,
            counter: 0,
            output_size,
            key_block,
            finished: false,
        };
        d.absorb_key();
        Ok(d)
    }

    /// A keyed instance is primed with the zero-padded key as its
    /// first block.
    fn absorb_key(&mut self) {
        if let Some(kb) = &self.key_block {
            self.buffer.copy_from_slice(&**kb);
            self.filled = BLOCK;
        }
    }

    fn feed(&mut self, mut data: &[u8]) {
        // lazy compression: the last buffered block waits for the
        // finalization flag
        while !data.is_empty() {
            if self.filled == BLOCK {
                self.counter += BLOCK as u128;
                let block = self.buffer;
                compress(&mut self.h, &block, self.counter, false);
                self.filled = 0;
            }
            let take = (BLOCK - self.filled).min(data.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
        }
    }
}

impl Digest for Blake2b {
    fn name(&self) -> &'static str {
        "BLAKE2B"
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn state_size(&self) -> usize {
        BLOCK
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        self.feed(data);
        Ok(())
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        if out.len() < self.output_size {
            return Err(CryptoError::ShortBuffer);
        }
        self.counter += self.filled as u128;
        self.buffer[self.filled..].fill(0);
        let block = self.buffer;
        compress(&mut self.h, &block, self.counter, true);
        let mut full = [0u8; 64];
        for (i, word) in self.h.iter().enumerate() {
            full[8 * i..8 * i + 8].copy_from_slice(&word.to_le_bytes());
        }
        out[..self.output_size].copy_from_slice(&full[..self.output_size]);
        self.finished = true;
        Ok(self.output_size)
    }

    fn reset(&mut self) {
        self.h = self.h0;
        self.buffer.zeroize();
        self.filled = 0;
        self.counter = 0;
        self.finished = false;
        self.absorb_key();
    }
}

impl Drop for Blake2b {
    fn drop(&mut self) {
        self.h.zeroize();
        self.h0.zeroize();
        self.buffer.zeroize();
        if let Some(kb) = &mut self.key_block {
            kb.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn digest(data: &[u8]) -> [u8; 64] {
        let mut d = Blake2b::new(64).unwrap();
        d.update(data).unwrap();
        let mut out = [0u8; 64];
        d.finalize_into(&mut out).unwrap();
        out
    }

    // RFC 7693 appendix A.
    #[test]
    fn rfc7693_abc() {
        assert_eq!(
            digest(b"abc"),
            hex!(
                "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1"
                "7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
            )
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            digest(b""),
            hex!(
                "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419"
                "d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce"
            )
        );
    }

    #[test]
    fn keyed_instance_resets_to_keyed_state() {
        let key: Vec<u8> = (0..64).collect();
        let mut d = Blake2b::with_params(64, &key, &[], &[]).unwrap();
        d.update(b"message").unwrap();
        let mut a = [0u8; 64];
        d.finalize_into(&mut a).unwrap();
        d.reset();
        d.update(b"message").unwrap();
        let mut b = [0u8; 64];
        d.finalize_into(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn truncated_outputs_differ_from_prefixes() {
        let mut d256 = Blake2b::new(32).unwrap();
        d256.update(b"abc").unwrap();
        let mut short = [0u8; 32];
        d256.finalize_into(&mut short).unwrap();
        // BLAKE2b-256 is not a prefix of BLAKE2b-512: the parameter
        // block feeds the output length into the IV
        assert_ne!(short[..], digest(b"abc")[..32]);
    }

    #[test]
    fn block_boundary_inputs() {
        for n in [127usize, 128, 129, 256] {
            let data = vec![0x2au8; n];
            let mut d = Blake2b::new(64).unwrap();
            for c in data.chunks(31) {
                d.update(c).unwrap();
            }
            let mut a = [0u8; 64];
            d.finalize_into(&mut a).unwrap();
            let mut e = Blake2b::new(64).unwrap();
            e.update(&data).unwrap();
            let mut b = [0u8; 64];
            e.finalize_into(&mut b).unwrap();
            assert_eq!(a, b);
        }
    }
}
