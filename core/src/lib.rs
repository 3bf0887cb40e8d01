//! Capability traits, error taxonomy and byte utilities shared by the
//! shroud crates.
//!
//! Everything a primitive crate needs to plug into the engine lives
//! here: the [`BlockCipher`], [`StreamCipher`], [`Digest`], [`Mac`],
//! [`Padding`], [`BlockModeCore`], [`CipherWrapper`] and [`Kdf`]
//! capability traits, the [`CryptoError`] taxonomy surfaced at every
//! boundary, and the constant-time / zeroizing byte helpers the
//! primitives are built from.
//!
//! # ⚠️ Security Warning: Hazmat!
//!
//! These are low-level building blocks. Nothing at this layer ensures
//! ciphertexts are authentic or keys are confirmed; use the engine
//! crate's configured pipelines for that.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod bytes;
mod error;
mod params;
mod traits;

pub use error::{CryptoError, Result};
pub use params::{CipherParameters, Direction};
pub use traits::{BlockCipher, BlockModeCore, CipherWrapper, Digest, Kdf, Mac, Padding, StreamCipher};
