//! Keccak sponge digests, in both the original submission flavor
//! (0x01 domain byte) and the standardized SHA-3 flavor (0x06).
//!
//! Rate is `1600 - 2 * output_bits`; 24 rounds of theta, rho, pi,
//! chi, iota with generated round constants and rotation offsets.

use shroud_core::{CryptoError, Digest, Result};
use zeroize::Zeroize;

const STATE_BYTES: usize = 200;

const fn round_constants() -> [u64; 24] {
    let mut rc = [0u64; 24];
    let mut lfsr = 1u8;
    let mut r = 0;
    while r < 24 {
        let mut v = 0u64;
        let mut j = 0;
        while j < 7 {
            if lfsr & 1 != 0 {
                v |= 1 << ((1u32 << j) - 1);
            }
            let hi = lfsr & 0x80;
            lfsr <<= 1;
            if hi != 0 {
                lfsr ^= 0x71;
            }
            j += 1;
        }
        rc[r] = v;
        r += 1;
    }
    rc
}

const RC: [u64; 24] = round_constants();

const fn rotation_offsets() -> [[u32; 5]; 5] {
    let mut r = [[0u32; 5]; 5];
    let (mut x, mut y) = (1usize, 0usize);
    let mut t = 0u32;
    while t < 24 {
        r[x][y] = ((t + 1) * (t + 2) / 2) % 64;
        let nx = y;
        let ny = (2 * x + 3 * y) % 5;
        x = nx;
        y = ny;
        t += 1;
    }
    r
}

const ROT: [[u32; 5]; 5] = rotation_offsets();

fn keccak_f(a: &mut [[u64; 5]; 5]) {
    for rc in RC {
        // theta
        let mut c = [0u64; 5];
        for x in 0..5 {
            c[x] = a[x][0] ^ a[x][1] ^ a[x][2] ^ a[x][3] ^ a[x][4];
        }
        for x in 0..5 {
            let d = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
            for y in 0..5 {
                a[x][y] ^= d;
            }
        }
        // rho + pi
        let mut b = [[0u64; 5]; 5];
        for x in 0..5 {
            for y in 0..5 {
                b[y][(2 * x + 3 * y) % 5] = a[x][y].rotate_left(ROT[x][y]);
            }
        }
        // chi + iota
        for x in 0..5 {
            for y in 0..5 {
                a[x][y] = b[x][y] ^ (!b[(x + 1) % 5][y] & b[(x + 2) % 5][y]);
            }
        }
        a[0][0] ^= rc;
    }
}

/// Sponge shared by both domain flavors.
struct Sponge {
    a: [[u64; 5]; 5],
    rate: usize,
    buffer: [u8; STATE_BYTES],
    filled: usize,
    output_size: usize,
    domain: u8,
    finished: bool,
}

impl Sponge {
    fn new(output_size: usize, domain: u8) -> Result<Self> {
        if !matches!(output_size, 28 | 32 | 48 | 64) {
            return Err(CryptoError::ArgumentInvalid("keccak output size"));
        }
        Ok(Sponge {
            a: [[0; 5]; 5],
            rate: STATE_BYTES - 2 * output_size,
            buffer: [0; STATE_BYTES],
            filled: 0,
            output_size,
            domain,
            finished: false,
        })
    }

    fn absorb_block(&mut self) {
        for i in 0..self.rate / 8 {
            let lane = u64::from_le_bytes(self.buffer[8 * i..8 * i + 8].try_into().unwrap());
            self.a[i % 5][i / 5] ^= lane;
        }
        keccak_f(&mut self.a);
        self.filled = 0;
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        for &byte in data {
            self.buffer[self.filled] = byte;
            self.filled += 1;
            if self.filled == self.rate {
                self.absorb_block();
            }
        }
        Ok(())
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.finished {
            return Err(CryptoError::InvalidState);
        }
        if out.len() < self.output_size {
            return Err(CryptoError::ShortBuffer);
        }
        self.buffer[self.filled..self.rate].fill(0);
        self.buffer[self.filled] = self.domain;
        self.buffer[self.rate - 1] ^= 0x80;
        self.filled = self.rate;
        self.absorb_block();
        for i in 0..self.output_size / 8 {
            out[8 * i..8 * i + 8].copy_from_slice(&self.a[i % 5][i / 5].to_le_bytes());
        }
        if self.output_size % 8 != 0 {
            let i = self.output_size / 8;
            let lane = self.a[i % 5][i / 5].to_le_bytes();
            out[8 * i..self.output_size].copy_from_slice(&lane[..self.output_size - 8 * i]);
        }
        self.finished = true;
        Ok(self.output_size)
    }

    fn reset(&mut self) {
        self.a = [[0; 5]; 5];
        self.buffer.zeroize();
        self.filled = 0;
        self.finished = false;
    }
}

impl Drop for Sponge {
    fn drop(&mut self) {
        for row in self.a.iter_mut() {
            row.zeroize();
        }
        self.buffer.zeroize();
    }
}

/// Original Keccak (0x01 padding), the registry's `Keccak224..512`.
pub struct Keccak(Sponge);

impl Keccak {
    /// Output size in bytes: 28, 32, 48 or 64.
    pub fn new(output_size: usize) -> Result<Self> {
        Ok(Keccak(Sponge::new(output_size, 0x01)?))
    }
}

impl Digest for Keccak {
    fn name(&self) -> &'static str {
        "Keccak"
    }
    fn output_size(&self) -> usize {
        self.0.output_size
    }
    fn state_size(&self) -> usize {
        self.0.rate
    }
    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.0.update(data)
    }
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        self.0.finalize_into(out)
    }
    fn reset(&mut self) {
        self.0.reset()
    }
}

/// FIPS 202 SHA-3 (0x06 padding).
pub struct Sha3(Sponge);

impl Sha3 {
    /// Output size in bytes: 28, 32, 48 or 64.
    pub fn new(output_size: usize) -> Result<Self> {
        Ok(Sha3(Sponge::new(output_size, 0x06)?))
    }
}

impl Digest for Sha3 {
    fn name(&self) -> &'static str {
        "SHA3"
    }
    fn output_size(&self) -> usize {
        self.0.output_size
    }
    fn state_size(&self) -> usize {
        self.0.rate
    }
    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.0.update(data)
    }
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        self.0.finalize_into(out)
    }
    fn reset(&mut self) {
        self.0.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn keccak256(data: &[u8]) -> [u8; 32] {
        let mut d = Keccak::new(32).unwrap();
        d.update(data).unwrap();
        let mut out = [0u8; 32];
        d.finalize_into(&mut out).unwrap();
        out
    }

    fn sha3_256(data: &[u8]) -> [u8; 32] {
        let mut d = Sha3::new(32).unwrap();
        d.update(data).unwrap();
        let mut out = [0u8; 32];
        d.finalize_into(&mut out).unwrap();
        out
    }

    #[test]
    fn original_keccak_domain() {
        assert_eq!(
            keccak256(b""),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
        assert_eq!(
            keccak256(b"abc"),
            hex!("4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45")
        );
    }

    #[test]
    fn sha3_domain() {
        assert_eq!(
            sha3_256(b"abc"),
            hex!("3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532")
        );
        assert_eq!(
            sha3_256(b""),
            hex!("a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a")
        );
    }

    #[test]
    fn sha3_512_abc() {
        let mut d = Sha3::new(64).unwrap();
        d.update(b"abc").unwrap();
        let mut out = [0u8; 64];
        d.finalize_into(&mut out).unwrap();
        assert_eq!(
            out,
            hex!(
                "b751850b1a57168a5693cd924b6b096e08f621827444f70d884f5d0240d2712e"
                "10e116e9192af3c91a7ec57647e3934057340b4cf408d5a56592f8274eec53f0"
            )
        );
    }

    #[test]
    fn rate_boundary_absorption() {
        // rate for 256-bit output is 136 bytes
        for n in [135usize, 136, 137] {
            let data = vec![0x55u8; n];
            let mut a = Sha3::new(32).unwrap();
            for c in data.chunks(17) {
                a.update(c).unwrap();
            }
            let mut x = [0u8; 32];
            a.finalize_into(&mut x).unwrap();
            assert_eq!(x, sha3_256(&data));
        }
    }
}
