//! Keyed message authentication: HMAC over any digest, CMAC over 64-
//! or 128-bit block ciphers, Poly1305, and the keyed BLAKE2b/Keccak
//! constructions.

mod cmac;
mod hmac;
mod keyed;
mod poly1305;

pub use cmac::Cmac;
pub use hmac::Hmac;
pub use keyed::{KeyedBlake2b, KeyedKeccak};
pub use poly1305::Poly1305;
