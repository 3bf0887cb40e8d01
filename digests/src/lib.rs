//! Hash and MAC primitives for the shroud engine.
//!
//! Digests implement [`Digest`](shroud_core::Digest): `update` after
//! `finalize_into` fails until `reset`. MACs implement
//! [`Mac`](shroud_core::Mac): `finalize_into` restores the keyed
//! post-init state, ready for the next message. All keyed state is
//! wiped on drop.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod blake2b;
mod keccak;
pub mod mac;
mod ripemd160;
mod sha256;
mod sha512;
mod tiger;
mod whirlpool;

pub use blake2b::Blake2b;
pub use keccak::{Keccak, Sha3};
pub use mac::{Cmac, Hmac, KeyedBlake2b, KeyedKeccak, Poly1305};
pub use ripemd160::Ripemd160;
pub use sha256::Sha256;
pub use sha512::Sha512;
pub use tiger::Tiger;
pub use whirlpool::Whirlpool;
