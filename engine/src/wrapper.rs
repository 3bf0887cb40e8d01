//! The two pipeline implementors of [`CipherWrapper`]: a block mode
//! with negotiated padding, and a bare stream cipher. The AEAD
//! transforms in the modes crate implement the trait themselves.

use shroud_core::{
    BlockModeCore, CipherWrapper, CryptoError, Direction, Padding, Result, StreamCipher,
};
use zeroize::Zeroize;

/// A block mode plus optional padding, driven one operation at a
/// time.
pub struct BlockModePipeline {
    mode: Box<dyn BlockModeCore + Send>,
    padding: Option<Box<dyn Padding + Send>>,
    direction: Direction,
}

impl BlockModePipeline {
    /// Modes whose padding requirement is `Always` must come with a
    /// padding; keystream-like modes must not.
    pub fn new(
        mode: Box<dyn BlockModeCore + Send>,
        padding: Option<Box<dyn Padding + Send>>,
        direction: Direction,
    ) -> Result<Self> {
        if mode.is_partial_block_ok() {
            if padding.is_some() {
                return Err(CryptoError::ConfigurationInvalid("padding-not-applicable"));
            }
        } else if padding.is_none() {
            return Err(CryptoError::ConfigurationInvalid("padding-required"));
        }
        Ok(BlockModePipeline {
            mode,
            padding,
            direction,
        })
    }
}

impl CipherWrapper for BlockModePipeline {
    fn name(&self) -> &'static str {
        self.mode.name()
    }

    fn operation_size(&self) -> usize {
        self.mode.block_size()
    }

    fn is_partial_block_ok(&self) -> bool {
        self.mode.is_partial_block_ok()
    }

    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.mode.process_block(input, output)
    }

    fn process_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.mode.block_size();
        if self.mode.is_partial_block_ok() {
            if input.is_empty() {
                return Ok(0);
            }
            return if input.len() == bs {
                self.mode.process_block(input, output)
            } else {
                self.mode.process_partial(input, output)
            };
        }
        let padding = self
            .padding
            .as_mut()
            .ok_or(CryptoError::ConfigurationInvalid("padding-required"))?;
        match self.direction {
            Direction::Encrypt => {
                // a full input block is emitted as-is, then padding
                // opens a fresh block
                let mut written = 0;
                let mut filled = input.len();
                let mut block = vec![0u8; bs];
                if filled == bs {
                    written += self.mode.process_block(input, output)?;
                    filled = 0;
                } else {
                    block[..filled].copy_from_slice(input);
                }
                padding.add_padding(&mut block, filled)?;
                if output.len() < written + bs {
                    block.zeroize();
                    return Err(CryptoError::ShortBuffer);
                }
                written += self
                    .mode
                    .process_block(&block, &mut output[written..])?;
                block.zeroize();
                Ok(written)
            }
            Direction::Decrypt => {
                // the held-back final ciphertext block
                if input.len() != bs {
                    return Err(CryptoError::CorruptPadding);
                }
                let mut block = vec![0u8; bs];
                self.mode.process_block(input, &mut block)?;
                let pad = padding.pad_count(&block)?;
                let keep = bs - pad;
                if output.len() < keep {
                    block.zeroize();
                    return Err(CryptoError::ShortBuffer);
                }
                output[..keep].copy_from_slice(&block[..keep]);
                block.zeroize();
                Ok(keep)
            }
        }
    }

    fn reset(&mut self) {
        self.mode.reset();
    }
}

/// A bare stream cipher as a pipeline; encrypt and decrypt are the
/// same XOR transform.
pub struct StreamCipherPipeline {
    cipher: Box<dyn StreamCipher + Send>,
}

impl StreamCipherPipeline {
    /// Wrap an initialized keystream generator.
    pub fn new(cipher: Box<dyn StreamCipher + Send>) -> Self {
        StreamCipherPipeline { cipher }
    }
}

impl CipherWrapper for StreamCipherPipeline {
    fn name(&self) -> &'static str {
        self.cipher.name()
    }

    fn operation_size(&self) -> usize {
        self.cipher.stride()
    }

    fn is_partial_block_ok(&self) -> bool {
        true
    }

    fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let n = self.operation_size();
        if input.len() < n || output.len() < n {
            return Err(CryptoError::ShortBuffer);
        }
        output[..n].copy_from_slice(&input[..n]);
        self.cipher.apply_keystream(&mut output[..n]);
        Ok(n)
    }

    fn process_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if output.len() < input.len() {
            return Err(CryptoError::ShortBuffer);
        }
        output[..input.len()].copy_from_slice(input);
        self.cipher.apply_keystream(&mut output[..input.len()]);
        Ok(input.len())
    }

    fn reset(&mut self) {
        self.cipher.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shroud_block_ciphers::Aes;
    use shroud_modes::{Cbc, Ctr, Pkcs7};
    use shroud_stream_ciphers::Salsa20;

    fn cbc_pipeline(direction: Direction) -> BlockModePipeline {
        let mode = Cbc::new(Aes::new(&[1u8; 16]).unwrap(), &[2u8; 16], direction).unwrap();
        BlockModePipeline::new(Box::new(mode), Some(Box::new(Pkcs7)), direction).unwrap()
    }

    #[test]
    fn padded_round_trip_all_tail_lengths() {
        for tail in [0usize, 1, 15] {
            let pt: Vec<u8> = (0..(16 + tail) as u8).collect();
            let mut enc = cbc_pipeline(Direction::Encrypt);
            let mut ct = vec![0u8; 48];
            let mut w = enc.process_bytes(&pt[..16], &mut ct).unwrap();
            w += enc.process_final(&pt[16..], &mut ct[w..]).unwrap();
            assert_eq!(w % 16, 0);
            assert_eq!(w, ((pt.len() / 16) + 1) * 16);
            ct.truncate(w);

            let mut dec = cbc_pipeline(Direction::Decrypt);
            let mut back = vec![0u8; w];
            let mut r = 0;
            for chunk in ct.chunks(16).take(ct.len() / 16 - 1) {
                r += dec.process_bytes(chunk, &mut back[r..]).unwrap();
            }
            r += dec
                .process_final(&ct[ct.len() - 16..], &mut back[r..])
                .unwrap();
            back.truncate(r);
            assert_eq!(back, pt);
        }
    }

    #[test]
    fn ctr_is_length_preserving() {
        let mode = Ctr::new(Aes::new(&[1u8; 16]).unwrap(), &[0u8; 16]).unwrap();
        let mut p =
            BlockModePipeline::new(Box::new(mode), None, Direction::Encrypt).unwrap();
        let mut out = [0u8; 16];
        assert_eq!(p.process_final(&[5u8; 5], &mut out).unwrap(), 5);
    }

    #[test]
    fn padding_negotiation_is_enforced() {
        let mode = Ctr::new(Aes::new(&[1u8; 16]).unwrap(), &[0u8; 16]).unwrap();
        assert!(BlockModePipeline::new(
            Box::new(mode),
            Some(Box::new(Pkcs7)),
            Direction::Encrypt
        )
        .is_err());
        let mode = Cbc::new(Aes::new(&[1u8; 16]).unwrap(), &[0u8; 16], Direction::Encrypt)
            .unwrap();
        assert!(BlockModePipeline::new(Box::new(mode), None, Direction::Encrypt).is_err());
    }

    #[test]
    fn stream_pipeline_round_trip() {
        let mk = || {
            Box::new(Salsa20::new(&[7u8; 32], &[1u8; 8]).unwrap())
                as Box<dyn shroud_core::StreamCipher + Send>
        };
        let mut enc = StreamCipherPipeline::new(mk());
        let pt = [0x5au8; 64];
        let mut ct = [0u8; 64];
        enc.process_bytes(&pt, &mut ct).unwrap();
        let mut dec = StreamCipherPipeline::new(mk());
        let mut back = [0u8; 64];
        dec.process_bytes(&ct, &mut back).unwrap();
        assert_eq!(back, pt);
    }
}
