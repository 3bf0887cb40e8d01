use zeroize::{Zeroize, ZeroizeOnDrop};

/// Transform direction of a cipher pipeline or stream.
///
/// Reading from an encrypt-configured stream, or writing to a
/// decrypt-configured one, fails with `InvalidState`; there is no
/// third value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext in, ciphertext out.
    Encrypt,
    /// Ciphertext in, plaintext out.
    Decrypt,
}

impl Direction {
    /// Flip the direction.
    pub fn invert(self) -> Self {
        match self {
            Direction::Encrypt => Direction::Decrypt,
            Direction::Decrypt => Direction::Encrypt,
        }
    }
}

/// Keying material handed to a primitive at init, as one exhaustive
/// tagged variant instead of a family of parameter objects.
///
/// All byte fields are wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub enum CipherParameters {
    /// A bare key (block ciphers, CMAC, keyed digests).
    Key {
        /// Raw key bytes.
        key: Vec<u8>,
    },
    /// Key plus IV/nonce (block modes, stream ciphers).
    KeyIv {
        /// Raw key bytes.
        key: Vec<u8>,
        /// IV for block modes (one block), nonce for stream ciphers.
        iv: Vec<u8>,
    },
    /// Key plus salt (salted MACs, KDF inputs).
    KeySalt {
        /// Raw key bytes.
        key: Vec<u8>,
        /// Salt observed before the message.
        salt: Vec<u8>,
    },
    /// Key, IV and salt together (nonce-and-salt MACs).
    KeyIvSalt {
        /// Raw key bytes.
        key: Vec<u8>,
        /// Nonce.
        iv: Vec<u8>,
        /// Salt observed before the message.
        salt: Vec<u8>,
    },
    /// The full AEAD parameter set.
    AeadFull {
        /// Raw key bytes.
        key: Vec<u8>,
        /// Nonce; reuse policy is the mode's.
        nonce: Vec<u8>,
        /// Tag length in bits.
        #[zeroize(skip)]
        mac_size_bits: u32,
        /// Associated data covered by the tag, possibly empty.
        aad: Vec<u8>,
    },
}

impl CipherParameters {
    /// The key bytes common to every variant.
    pub fn key(&self) -> &[u8] {
        match self {
            CipherParameters::Key { key }
            | CipherParameters::KeyIv { key, .. }
            | CipherParameters::KeySalt { key, .. }
            | CipherParameters::KeyIvSalt { key, .. }
            | CipherParameters::AeadFull { key, .. } => key,
        }
    }

    /// The IV/nonce, if this variant carries one.
    pub fn iv(&self) -> Option<&[u8]> {
        match self {
            CipherParameters::KeyIv { iv, .. } | CipherParameters::KeyIvSalt { iv, .. } => {
                Some(iv)
            }
            CipherParameters::AeadFull { nonce, .. } => Some(nonce),
            _ => None,
        }
    }

    /// The salt, if this variant carries one.
    pub fn salt(&self) -> Option<&[u8]> {
        match self {
            CipherParameters::KeySalt { salt, .. } | CipherParameters::KeyIvSalt { salt, .. } => {
                Some(salt)
            }
            _ => None,
        }
    }
}
