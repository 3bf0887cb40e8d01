//! Tee-style decorators that observe every byte crossing them and
//! emit a MAC or digest on demand.
//!
//! The authenticator output slot is zero-filled until `finalize_auth`
//! runs; callers comparing a MAC against an expected value must use
//! the constant-time comparison from the core crate.

use std::io::{Read, Write};

use shroud_core::{CryptoError, Digest, Mac};

macro_rules! tee_writer {
    ($(#[$meta:meta])* $name:ident, $auth:ident, $authty:path) => {
        $(#[$meta])*
        pub struct $name<W: Write> {
            inner: W,
            $auth: Box<dyn $authty + Send>,
            output: Vec<u8>,
            finalized: bool,
            bytes_seen: u64,
        }

        impl<W: Write> $name<W> {
            /// Wrap `inner`; every byte successfully written is
            /// observed.
            pub fn new(inner: W, $auth: Box<dyn $authty + Send>) -> Self {
                let n = $auth.output_size();
                $name {
                    inner,
                    $auth,
                    output: vec![0; n],
                    finalized: false,
                    bytes_seen: 0,
                }
            }

            /// The tag/digest slot: zeros before finalization.
            pub fn output(&self) -> &[u8] {
                &self.output
            }

            /// Bytes observed so far.
            pub fn bytes_seen(&self) -> u64 {
                self.bytes_seen
            }

            /// Finalize the authenticator into the output slot and
            /// return it.
            pub fn finalize_auth(&mut self) -> shroud_core::Result<&[u8]> {
                if self.finalized {
                    return Err(CryptoError::InvalidState);
                }
                self.$auth.finalize_into(&mut self.output)?;
                self.finalized = true;
                Ok(&self.output)
            }

            /// Give the inner writer back.
            pub fn into_inner(self) -> W {
                self.inner
            }
        }

        impl<W: Write> Write for $name<W> {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                let n = self.inner.write(buf)?;
                self.$auth
                    .update(&buf[..n])
                    .map_err(std::io::Error::from)?;
                self.bytes_seen += n as u64;
                Ok(n)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                self.inner.flush()
            }
        }
    };
}

macro_rules! tee_reader {
    ($(#[$meta:meta])* $name:ident, $auth:ident, $authty:path) => {
        $(#[$meta])*
        pub struct $name<R: Read> {
            inner: R,
            $auth: Box<dyn $authty + Send>,
            output: Vec<u8>,
            finalized: bool,
            bytes_seen: u64,
        }

        impl<R: Read> $name<R> {
            /// Wrap `inner`; every byte read through is observed.
            pub fn new(inner: R, $auth: Box<dyn $authty + Send>) -> Self {
                let n = $auth.output_size();
                $name {
                    inner,
                    $auth,
                    output: vec![0; n],
                    finalized: false,
                    bytes_seen: 0,
                }
            }

            /// The tag/digest slot: zeros before finalization.
            pub fn output(&self) -> &[u8] {
                &self.output
            }

            /// Bytes observed so far.
            pub fn bytes_seen(&self) -> u64 {
                self.bytes_seen
            }

            /// Finalize the authenticator into the output slot and
            /// return it.
            pub fn finalize_auth(&mut self) -> shroud_core::Result<&[u8]> {
                if self.finalized {
                    return Err(CryptoError::InvalidState);
                }
                self.$auth.finalize_into(&mut self.output)?;
                self.finalized = true;
                Ok(&self.output)
            }

            /// Give the inner reader back.
            pub fn into_inner(self) -> R {
                self.inner
            }
        }

        impl<R: Read> Read for $name<R> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = self.inner.read(buf)?;
                self.$auth
                    .update(&buf[..n])
                    .map_err(std::io::Error::from)?;
                self.bytes_seen += n as u64;
                Ok(n)
            }
        }
    };
}

tee_writer! {
    /// A writer observing all bytes through a keyed MAC.
    MacWriter, mac, Mac
}

tee_writer! {
    /// A writer observing all bytes through an unkeyed digest.
    HashWriter, digest, Digest
}

tee_reader! {
    /// A reader observing all bytes through a keyed MAC.
    MacReader, mac, Mac
}

tee_reader! {
    /// A reader observing all bytes through an unkeyed digest.
    HashReader, digest, Digest
}
