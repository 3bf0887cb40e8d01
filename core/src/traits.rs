use crate::Result;

/// A keyed permutation on a fixed-size block, operated in place.
///
/// The key schedule is derived by the concrete type's constructor,
/// which rejects keys outside the primitive's allowable sizes with
/// `InvalidKeySize`. `encrypt_block`/`decrypt_block` fail
/// `ShortBuffer` unless the slice is exactly one block.
pub trait BlockCipher {
    /// Stable registry name of the primitive.
    fn name(&self) -> &'static str;

    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Encrypt one block in place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Decrypt one block in place.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<()>;

    /// Restore post-init state. Block ciphers keep no per-block
    /// state, so the default is a no-op; subkeys are not re-derived.
    fn reset(&mut self) {}
}

impl BlockCipher for Box<dyn BlockCipher + Send> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn block_size(&self) -> usize {
        (**self).block_size()
    }
    fn encrypt_block(&self, block: &mut [u8]) -> Result<()> {
        (**self).encrypt_block(block)
    }
    fn decrypt_block(&self, block: &mut [u8]) -> Result<()> {
        (**self).decrypt_block(block)
    }
    fn reset(&mut self) {
        (**self).reset()
    }
}

/// A key+nonce keystream generator applied by XOR.
///
/// Keystream is produced lazily in the cipher's natural stride;
/// partial-stride consumption is tracked internally, so chunked and
/// one-shot application produce identical output.
pub trait StreamCipher {
    /// Stable registry name of the primitive.
    fn name(&self) -> &'static str;

    /// Natural keystream stride in bytes (64 for Salsa20, 16 for
    /// Rabbit, 4 for the HC family).
    fn stride(&self) -> usize;

    /// XOR the next `data.len()` keystream bytes into `data`.
    fn apply_keystream(&mut self, data: &mut [u8]);

    /// Restore the post-init state: keystream position zero.
    fn reset(&mut self);
}

/// An unkeyed message digest.
///
/// `update` after `finalize_into` fails `InvalidState` until `reset`
/// is called; hashes do not auto-reset.
pub trait Digest {
    /// Stable registry name of the primitive.
    fn name(&self) -> &'static str;

    /// Digest length in bytes.
    fn output_size(&self) -> usize;

    /// Internal block/sponge width in bytes.
    fn state_size(&self) -> usize;

    /// Absorb message bytes.
    fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Write the digest into `out` and return the byte count.
    /// Fails `ShortBuffer` if `out` is shorter than `output_size()`.
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize>;

    /// Restore the post-construction state.
    fn reset(&mut self);
}

impl Digest for Box<dyn Digest + Send> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn output_size(&self) -> usize {
        (**self).output_size()
    }
    fn state_size(&self) -> usize {
        (**self).state_size()
    }
    fn update(&mut self, data: &[u8]) -> Result<()> {
        (**self).update(data)
    }
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        (**self).finalize_into(out)
    }
    fn reset(&mut self) {
        (**self).reset()
    }
}

/// A keyed message authentication code.
///
/// Unlike [`Digest`], `finalize_into` restores the post-init state so
/// the same keyed instance can authenticate the next message.
pub trait Mac {
    /// Stable registry name of the function.
    fn name(&self) -> &'static str;

    /// Tag length in bytes.
    fn output_size(&self) -> usize;

    /// Internal block width in bytes.
    fn state_size(&self) -> usize;

    /// Absorb message bytes.
    fn update(&mut self, data: &[u8]) -> Result<()>;

    /// Write the tag into `out`, reset to post-init state, return the
    /// byte count written.
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize>;

    /// Restore the post-init state, discarding any absorbed input.
    fn reset(&mut self);
}

impl Mac for Box<dyn Mac + Send> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn output_size(&self) -> usize {
        (**self).output_size()
    }
    fn state_size(&self) -> usize {
        (**self).state_size()
    }
    fn update(&mut self, data: &[u8]) -> Result<()> {
        (**self).update(data)
    }
    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        (**self).finalize_into(out)
    }
    fn reset(&mut self) {
        (**self).reset()
    }
}

/// A block padding scheme.
pub trait Padding {
    /// Stable registry name of the scheme.
    fn name(&self) -> &'static str;

    /// Fill `block[filled..]` with padding and return the number of
    /// bytes added. `filled` may be 0 (a whole padding block) but not
    /// the block size.
    fn add_padding(&mut self, block: &mut [u8], filled: usize) -> Result<usize>;

    /// Inspect a decrypted final block and return the padding length.
    ///
    /// Validation runs over the whole block whatever the outcome and
    /// reports any mismatch as the single `CorruptPadding` kind.
    fn pad_count(&self, block: &[u8]) -> Result<usize>;
}

/// A block mode driven one block at a time by a pipeline.
///
/// Direction is fixed at construction. Partial-block-capable modes
/// (CTR, CFB, OFB) accept a short final block through
/// `process_partial`; CBC does not.
pub trait BlockModeCore {
    /// Stable registry name of the mode.
    fn name(&self) -> &'static str;

    /// Block size in bytes of the wrapped cipher.
    fn block_size(&self) -> usize;

    /// Whether a final block shorter than `block_size` is acceptable
    /// without padding.
    fn is_partial_block_ok(&self) -> bool;

    /// Transform exactly one block from `input` into `output`,
    /// returning the bytes written.
    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Transform a final short block (`input.len() < block_size`).
    /// Fails `InvalidState` on modes that cannot.
    fn process_partial(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Restore the post-init state (IV/counter position zero).
    fn reset(&mut self);
}

/// The uniform streaming transform over any cipher configuration.
///
/// Implemented by the block-mode and stream-cipher pipelines and by
/// the AEAD transforms. Byte accounting invariant: the total emitted
/// by `process_bytes` plus `process_final` equals the total consumed,
/// plus the tag on AEAD encrypt and minus it on AEAD decrypt.
pub trait CipherWrapper {
    /// Stable name of the composed transform, for diagnostics.
    fn name(&self) -> &'static str;

    /// Bytes consumed per `process_bytes` call.
    fn operation_size(&self) -> usize;

    /// Whether `process_final` accepts input shorter than one
    /// operation without padding.
    fn is_partial_block_ok(&self) -> bool;

    /// Consume exactly `operation_size()` bytes of `input`, write any
    /// ready output and return the count. AEAD decryption may retain
    /// everything and return 0.
    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Consume the final `input` (shorter than one operation for
    /// block modes, any length otherwise), emit padding/tag on
    /// encrypt or strip/verify on decrypt, and return the bytes
    /// written.
    fn process_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Restore the post-init state.
    fn reset(&mut self);
}

/// A key derivation function behind the opaque
/// `(ikm, salt, len) -> okm` contract used by key confirmation.
pub trait Kdf {
    /// Stable registry name of the function.
    fn name(&self) -> &'static str;

    /// Fill `okm` with derived key material.
    fn derive(&self, ikm: &[u8], salt: &[u8], okm: &mut [u8]) -> Result<()>;
}
