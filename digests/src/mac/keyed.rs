//! Keyed digests used directly as MACs: BLAKE2b through its key
//! parameter, Keccak by prefixing key and optional salt (the sponge
//! is immune to length extension, so prefix keying is sound).

use shroud_core::{CryptoError, Digest, Mac, Result};
use zeroize::Zeroize;

use crate::{Blake2b, Keccak};

/// BLAKE2b in keyed mode, with optional salt.
pub struct KeyedBlake2b {
    inner: Blake2b,
}

impl KeyedBlake2b {
    /// `output_size` 1..=64 bytes, key 1..=64 bytes, salt up to 16.
    pub fn new(output_size: usize, key: &[u8], salt: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(CryptoError::InvalidKeySize);
        }
        Ok(KeyedBlake2b {
            inner: Blake2b::with_params(output_size, key, salt, &[])?,
        })
    }
}

impl Mac for KeyedBlake2b {
    fn name(&self) -> &'static str {
        "BLAKE2B"
    }

    fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    fn state_size(&self) -> usize {
        self.inner.state_size()
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.inner.update(data)
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let n = self.inner.finalize_into(out)?;
        self.inner.reset();
        Ok(n)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

/// Keccak keyed by absorbing `key` (then `salt`, if any) ahead of the
/// message.
pub struct KeyedKeccak {
    inner: Keccak,
    key: Vec<u8>,
    salt: Vec<u8>,
}

impl KeyedKeccak {
    /// `output_size` one of 28/32/48/64 bytes.
    pub fn new(output_size: usize, key: &[u8], salt: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(CryptoError::InvalidKeySize);
        }
        let mut mac = KeyedKeccak {
            inner: Keccak::new(output_size)?,
            key: key.to_vec(),
            salt: salt.to_vec(),
        };
        mac.prime()?;
        Ok(mac)
    }

    fn prime(&mut self) -> Result<()> {
        self.inner.update(&self.key)?;
        if !self.salt.is_empty() {
            self.inner.update(&self.salt)?;
        }
        Ok(())
    }
}

impl Mac for KeyedKeccak {
    fn name(&self) -> &'static str {
        "Keccak"
    }

    fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    fn state_size(&self) -> usize {
        self.inner.state_size()
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.inner.update(data)
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let n = self.inner.finalize_into(out)?;
        self.reset();
        Ok(n)
    }

    fn reset(&mut self) {
        self.inner.reset();
        // re-absorbing the stored key cannot fail after construction
        let _ = self.prime();
    }
}

impl Drop for KeyedKeccak {
    fn drop(&mut self) {
        self.key.zeroize();
        self.salt.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_blake2b_differs_from_unkeyed() {
        let mut keyed = KeyedBlake2b::new(32, b"secret key", &[]).unwrap();
        keyed.update(b"message").unwrap();
        let mut a = [0u8; 32];
        keyed.finalize_into(&mut a).unwrap();

        let mut plain = Blake2b::new(32).unwrap();
        plain.update(b"message").unwrap();
        let mut b = [0u8; 32];
        plain.finalize_into(&mut b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn keyed_keccak_reset_cycle() {
        let mut mac = KeyedKeccak::new(32, b"k", b"salt").unwrap();
        mac.update(b"payload").unwrap();
        let mut a = [0u8; 32];
        mac.finalize_into(&mut a).unwrap();
        mac.update(b"payload").unwrap();
        let mut b = [0u8; 32];
        mac.finalize_into(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn salt_separates_streams() {
        let mut x = KeyedKeccak::new(32, b"k", b"salt-a").unwrap();
        let mut y = KeyedKeccak::new(32, b"k", b"salt-b").unwrap();
        x.update(b"m").unwrap();
        y.update(b"m").unwrap();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        x.finalize_into(&mut a).unwrap();
        y.finalize_into(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
