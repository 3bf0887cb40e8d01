//! Block cipher primitives for the shroud engine.
//!
//! Every cipher is a keyed in-place block transform behind the
//! [`BlockCipher`](shroud_core::BlockCipher) trait: the constructor
//! derives the full key schedule (rejecting keys outside the
//! primitive's allowable sizes), `encrypt_block`/`decrypt_block`
//! permute exactly one block, and key schedules are wiped on drop.
//!
//! # ⚠️ Security Warning: Hazmat!
//!
//! A raw block cipher is not an encryption scheme. Use the mode and
//! engine crates to get streaming transforms and authentication.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod aes;
mod blowfish;
mod camellia;
mod cast5;
mod cast6;
mod des;
mod idea;
mod noekeon;
mod rc6;
mod serpent;
mod twofish;

pub use aes::Aes;
pub use blowfish::Blowfish;
pub use camellia::Camellia;
pub use cast5::Cast5;
pub use cast6::Cast6;
pub use des::TripleDes;
pub use idea::Idea;
pub use noekeon::Noekeon;
pub use rc6::Rc6;
pub use serpent::Serpent;
pub use twofish::Twofish;

use shroud_core::{CryptoError, Result};

/// Shared guard: exactly one block at the given size.
#[inline]
pub(crate) fn check_block(block: &[u8], size: usize) -> Result<()> {
    if block.len() != size {
        return Err(CryptoError::ShortBuffer);
    }
    Ok(())
}
