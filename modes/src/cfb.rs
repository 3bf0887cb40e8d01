//! Cipher Feedback in full-block mode; partial final blocks are fine.

use shroud_core::{BlockCipher, BlockModeCore, CryptoError, Direction, Result};
use zeroize::Zeroize;

/// CFB over any block cipher.
pub struct Cfb<C: BlockCipher> {
    cipher: C,
    iv: Vec<u8>,
    feedback: Vec<u8>,
    scratch: Vec<u8>,
    direction: Direction,
}

impl<C: BlockCipher> Cfb<C> {
    /// The IV must be exactly one block.
    pub fn new(cipher: C, iv: &[u8], direction: Direction) -> Result<Self> {
        if iv.len() != cipher.block_size() {
            return Err(CryptoError::InvalidIvSize);
        }
        Ok(Cfb {
            feedback: iv.to_vec(),
            scratch: vec![0; iv.len()],
            iv: iv.to_vec(),
            cipher,
            direction,
        })
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8], n: usize) -> Result<usize> {
        let bs = self.cipher.block_size();
        self.scratch.copy_from_slice(&self.feedback);
        self.cipher.encrypt_block(&mut self.scratch)?;
        for i in 0..n {
            output[i] = input[i] ^ self.scratch[i];
        }
        if n == bs {
            // the ciphertext becomes the next feedback register
            match self.direction {
                Direction::Encrypt => self.feedback.copy_from_slice(&output[..bs]),
                Direction::Decrypt => self.feedback.copy_from_slice(&input[..bs]),
            }
        }
        Ok(n)
    }
}

impl<C: BlockCipher> BlockModeCore for Cfb<C> {
    fn name(&self) -> &'static str {
        "CFB"
    }

    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn is_partial_block_ok(&self) -> bool {
        true
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.cipher.block_size();
        if input.len() < bs || output.len() < bs {
            return Err(CryptoError::ShortBuffer);
        }
        self.transform(input, output, bs)
    }

    fn process_partial(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        if input.len() > self.cipher.block_size() || output.len() < input.len() {
            return Err(CryptoError::ShortBuffer);
        }
        self.transform(input, output, input.len())
    }

    fn reset(&mut self) {
        self.feedback.copy_from_slice(&self.iv);
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for Cfb<C> {
    fn drop(&mut self) {
        self.feedback.zeroize();
        self.iv.zeroize();
        self.scratch.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::Aes;

    // NIST SP 800-38A F.3.13 (CFB128).
    #[test]
    fn sp800_38a_cfb128_aes128() {
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex!("000102030405060708090a0b0c0d0e0f");
        let pt = hex!(
            "6bc1bee22e409f96e93d7e117393172a"
            "ae2d8a571e03ac9c9eb76fac45af8e51"
        );
        let ct = hex!(
            "3b3fd92eb72dad20333449f8e83cfb4a"
            "c8a64537a0b3a93fcde3cdad9f1ce58b"
        );
        let mut enc = Cfb::new(Aes::new(&key).unwrap(), &iv, Direction::Encrypt).unwrap();
        let mut out = [0u8; 32];
        enc.process_block(&pt[..16], &mut out[..16]).unwrap();
        enc.process_block(&pt[16..], &mut out[16..]).unwrap();
        assert_eq!(out, ct);

        let mut dec = Cfb::new(Aes::new(&key).unwrap(), &iv, Direction::Decrypt).unwrap();
        let mut back = [0u8; 32];
        dec.process_block(&ct[..16], &mut back[..16]).unwrap();
        dec.process_block(&ct[16..], &mut back[16..]).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn partial_tail_round_trip() {
        let key = [3u8; 16];
        let iv = [5u8; 16];
        let mut enc = Cfb::new(Aes::new(&key).unwrap(), &iv, Direction::Encrypt).unwrap();
        let mut ct = [0u8; 16 + 7];
        enc.process_block(&[0x61; 16], &mut ct[..16]).unwrap();
        enc.process_partial(&[0x62; 7], &mut ct[16..]).unwrap();

        let mut dec = Cfb::new(Aes::new(&key).unwrap(), &iv, Direction::Decrypt).unwrap();
        let mut pt = [0u8; 16 + 7];
        dec.process_block(&ct[..16], &mut pt[..16]).unwrap();
        dec.process_partial(&ct[16..], &mut pt[16..]).unwrap();
        assert_eq!(&pt[..16], &[0x61; 16]);
        assert_eq!(&pt[16..], &[0x62; 7]);
    }
}
