//! Stream cipher primitives for the shroud engine.
//!
//! Each cipher is a key+nonce keystream generator behind the
//! [`StreamCipher`](shroud_core::StreamCipher) trait. Keystream is
//! produced lazily in the cipher's natural stride and applied by XOR;
//! partial-stride positions are tracked so chunked application equals
//! one-shot application byte for byte.
//!
//! # ⚠️ Security Warning: Hazmat!
//!
//! Nothing here authenticates ciphertext, and reusing a (key, nonce)
//! pair destroys confidentiality. The engine crate's pipelines add
//! the missing pieces.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod hc128;
mod hc256;
mod rabbit;
mod salsa20;
mod sosemanuk;

pub use hc128::Hc128;
pub use hc256::Hc256;
pub use rabbit::Rabbit;
pub use salsa20::Salsa20;
pub use sosemanuk::Sosemanuk;
