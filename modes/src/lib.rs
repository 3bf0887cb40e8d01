//! Modes of operation and paddings for the shroud engine.
//!
//! CBC, CTR, CFB and OFB turn a block cipher into a byte-stream
//! transform behind [`BlockModeCore`](shroud_core::BlockModeCore);
//! GCM and EAX produce authenticated transforms implementing
//! [`CipherWrapper`](shroud_core::CipherWrapper) directly. The five
//! paddings negotiate final-block handling for the non-partial modes.
//!
//! # ⚠️ Security Warning
//!
//! The unauthenticated modes do not ensure ciphertext integrity; pair
//! them with a MAC stream or use the AEAD transforms.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cbc;
mod cfb;
mod ctr;
mod eax;
mod gcm;
mod ofb;
mod padding;

pub use cbc::Cbc;
pub use cfb::Cfb;
pub use ctr::Ctr;
pub use eax::Eax;
pub use gcm::Gcm;
pub use ofb::Ofb;
pub use padding::{Iso10126, Iso7816, Pkcs7, Tbc, X923};
