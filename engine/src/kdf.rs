//! The two registry KDFs behind the opaque `(ikm, salt, len) -> okm`
//! contract: PBKDF2-HMAC and scrypt.

use shroud_core::{CryptoError, Kdf, Mac, Result};
use zeroize::Zeroize;

use crate::config::build_digest;
use crate::registry::HashKind;
use shroud_digests::Hmac;

/// PBKDF2 (RFC 2898) over any registry hash.
pub struct Pbkdf2 {
    /// PRF hash.
    pub hash: HashKind,
    /// Iteration count.
    pub iterations: u32,
}

impl Default for Pbkdf2 {
    fn default() -> Self {
        Pbkdf2 {
            hash: HashKind::Sha256,
            iterations: 32768,
        }
    }
}

/// One PBKDF2 run with an explicit iteration count.
pub(crate) fn pbkdf2(
    hash: HashKind,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    okm: &mut [u8],
) -> Result<()> {
    if iterations == 0 {
        return Err(CryptoError::ArgumentInvalid("zero iterations"));
    }
    let digest = build_digest(hash)?;
    let mut prf = Hmac::new(digest, password)?;
    let hlen = prf.output_size();
    let mut block_index = 1u32;
    let mut offset = 0;
    let mut u = vec![0u8; hlen];
    let mut t = vec![0u8; hlen];
    while offset < okm.len() {
        // U1 = PRF(salt || INT(i)), Uj = PRF(U_{j-1}), T = xor(Uj)
        prf.update(salt)?;
        prf.update(&block_index.to_be_bytes())?;
        prf.finalize_into(&mut u)?;
        t.copy_from_slice(&u);
        for _ in 1..iterations {
            prf.update(&u)?;
            prf.finalize_into(&mut u)?;
            for (tb, ub) in t.iter_mut().zip(&u) {
                *tb ^= ub;
            }
        }
        let take = hlen.min(okm.len() - offset);
        okm[offset..offset + take].copy_from_slice(&t[..take]);
        offset += take;
        block_index += 1;
    }
    u.zeroize();
    t.zeroize();
    Ok(())
}

impl Kdf for Pbkdf2 {
    fn name(&self) -> &'static str {
        "PBKDF2"
    }

    fn derive(&self, ikm: &[u8], salt: &[u8], okm: &mut [u8]) -> Result<()> {
        pbkdf2(self.hash, ikm, salt, self.iterations, okm)
    }
}

/// scrypt (RFC 7914): Salsa20/8-core block mixing over PBKDF2-HMAC-
/// SHA-256 endpoints.
pub struct Scrypt {
    /// CPU/memory cost; a power of two greater than one.
    pub n: u32,
    /// Block size multiplier.
    pub r: u32,
    /// Parallelization.
    pub p: u32,
}

impl Default for Scrypt {
    fn default() -> Self {
        Scrypt {
            n: 16384,
            r: 8,
            p: 1,
        }
    }
}

/// Salsa20/8 core over a 64-byte block, in place.
fn salsa20_8(block: &mut [u8; 64]) {
    let mut x = [0u32; 16];
    for (i, chunk) in block.chunks_exact(4).enumerate() {
        x[i] = u32::from_le_bytes(chunk.try_into().unwrap());
    }
    let input = x;
    for _ in 0..4 {
        // column then row quarter-rounds
        for &(a, b, c, d) in &[
            (0usize, 4usize, 8usize, 12usize),
            (5, 9, 13, 1),
            (10, 14, 2, 6),
            (15, 3, 7, 11),
            (0, 1, 2, 3),
            (5, 6, 7, 4),
            (10, 11, 8, 9),
            (15, 12, 13, 14),
        ] {
            x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
            x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
            x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
            x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
        }
    }
    for (i, chunk) in block.chunks_exact_mut(4).enumerate() {
        chunk.copy_from_slice(&x[i].wrapping_add(input[i]).to_le_bytes());
    }
}

/// BlockMix_{Salsa20/8, r} over a 128r-byte block.
fn block_mix(block: &[u8], out: &mut [u8], r: usize) {
    let mut x: [u8; 64] = block[(2 * r - 1) * 64..].try_into().unwrap();
    for i in 0..2 * r {
        for (xb, bb) in x.iter_mut().zip(&block[i * 64..(i + 1) * 64]) {
            *xb ^= bb;
        }
        salsa20_8(&mut x);
        // even chunks to the front half, odd to the back
        let dst = if i % 2 == 0 { i / 2 } else { r + i / 2 };
        out[dst * 64..(dst + 1) * 64].copy_from_slice(&x);
    }
}

impl Kdf for Scrypt {
    fn name(&self) -> &'static str {
        "Scrypt"
    }

    fn derive(&self, ikm: &[u8], salt: &[u8], okm: &mut [u8]) -> Result<()> {
        let (n, r, p) = (self.n as usize, self.r as usize, self.p as usize);
        if n < 2 || !n.is_power_of_two() {
            return Err(CryptoError::ArgumentInvalid("scrypt n"));
        }
        if r == 0 || p == 0 {
            return Err(CryptoError::ArgumentInvalid("scrypt r/p"));
        }
        let block_len = 128 * r;
        let mut b = vec![0u8; block_len * p];
        pbkdf2(HashKind::Sha256, ikm, salt, 1, &mut b)?;
        let mut v = vec![0u8; block_len * n];
        let mut y = vec![0u8; block_len];
        for chunk in b.chunks_exact_mut(block_len) {
            // ROMix
            for j in 0..n {
                v[j * block_len..(j + 1) * block_len].copy_from_slice(chunk);
                block_mix(&v[j * block_len..(j + 1) * block_len], &mut y, r);
                chunk.copy_from_slice(&y);
            }
            for _ in 0..n {
                let j = integerify(chunk, r) & (n - 1);
                for (cb, vb) in chunk.iter_mut().zip(&v[j * block_len..(j + 1) * block_len]) {
                    *cb ^= vb;
                }
                block_mix(chunk, &mut y, r);
                chunk.copy_from_slice(&y);
            }
        }
        pbkdf2(HashKind::Sha256, ikm, &b, 1, okm)?;
        b.zeroize();
        v.zeroize();
        y.zeroize();
        Ok(())
    }
}

/// The low 64 bits of the last 64-byte sub-block, little-endian.
fn integerify(block: &[u8], r: usize) -> usize {
    let off = (2 * r - 1) * 64;
    u64::from_le_bytes(block[off..off + 8].try_into().unwrap()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // RFC 6070-style PBKDF2-HMAC-SHA256 vectors.
    #[test]
    fn pbkdf2_sha256_vectors() {
        let mut out = [0u8; 32];
        pbkdf2(HashKind::Sha256, b"password", b"salt", 1, &mut out).unwrap();
        assert_eq!(
            out,
            hex!("120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b")
        );
        pbkdf2(HashKind::Sha256, b"password", b"salt", 4096, &mut out).unwrap();
        assert_eq!(
            out,
            hex!("c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a")
        );
    }

    // RFC 7914 §12, the cheap parameter set.
    #[test]
    fn scrypt_rfc7914_vector1() {
        let s = Scrypt { n: 16, r: 1, p: 1 };
        let mut out = [0u8; 64];
        s.derive(b"", b"", &mut out).unwrap();
        assert_eq!(
            out[..32],
            hex!("77d6576238657b203b19ca42c18a0497f16b4844e3074ae8dfdffa3fede21442")
        );
    }

    // RFC 7914 §12, the "password"/"NaCl" set.
    #[test]
    fn scrypt_rfc7914_vector2() {
        let s = Scrypt {
            n: 1024,
            r: 8,
            p: 16,
        };
        let mut out = [0u8; 64];
        s.derive(b"password", b"NaCl", &mut out).unwrap();
        assert_eq!(
            out[..32],
            hex!("fdbabe1c9d3472007856e7190d01e9fe7c6ad7cbc8237830e77376634b373162")
        );
    }

    #[test]
    fn scrypt_rejects_bad_n() {
        let s = Scrypt { n: 15, r: 1, p: 1 };
        let mut out = [0u8; 16];
        assert!(s.derive(b"x", b"y", &mut out).is_err());
    }
}
