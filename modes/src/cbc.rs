//! Cipher Block Chaining. Requires padding; not partial-block
//! capable.

use shroud_core::{BlockCipher, BlockModeCore, CryptoError, Direction, Result};
use zeroize::Zeroize;

/// CBC over any block cipher.
pub struct Cbc<C: BlockCipher> {
    cipher: C,
    iv: Vec<u8>,
    chain: Vec<u8>,
    direction: Direction,
}

impl<C: BlockCipher> Cbc<C> {
    /// The IV must be exactly one block.
    pub fn new(cipher: C, iv: &[u8], direction: Direction) -> Result<Self> {
        if iv.len() != cipher.block_size() {
            return Err(CryptoError::InvalidIvSize);
        }
        Ok(Cbc {
            chain: iv.to_vec(),
            iv: iv.to_vec(),
            cipher,
            direction,
        })
    }
}

impl<C: BlockCipher> BlockModeCore for Cbc<C> {
    fn name(&self) -> &'static str {
        "CBC"
    }

    fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn is_partial_block_ok(&self) -> bool {
        false
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.cipher.block_size();
        if input.len() < bs || output.len() < bs {
            return Err(CryptoError::ShortBuffer);
        }
        match self.direction {
            Direction::Encrypt => {
                for i in 0..bs {
                    output[i] = input[i] ^ self.chain[i];
                }
                self.cipher.encrypt_block(&mut output[..bs])?;
                self.chain.copy_from_slice(&output[..bs]);
            }
            Direction::Decrypt => {
                output[..bs].copy_from_slice(&input[..bs]);
                self.cipher.decrypt_block(&mut output[..bs])?;
                for i in 0..bs {
                    output[i] ^= self.chain[i];
                }
                self.chain.copy_from_slice(&input[..bs]);
            }
        }
        Ok(bs)
    }

    fn process_partial(&mut self, _input: &[u8], _output: &mut [u8]) -> Result<usize> {
        Err(CryptoError::InvalidState)
    }

    fn reset(&mut self) {
        self.chain.copy_from_slice(&self.iv);
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for Cbc<C> {
    fn drop(&mut self) {
        self.chain.zeroize();
        self.iv.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::Aes;

    // NIST SP 800-38A F.2.1.
    #[test]
    fn sp800_38a_cbc_aes128() {
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex!("000102030405060708090a0b0c0d0e0f");
        let pt = hex!(
            "6bc1bee22e409f96e93d7e117393172a"
            "ae2d8a571e03ac9c9eb76fac45af8e51"
        );
        let ct = hex!(
            "7649abac8119b246cee98e9b12e9197d"
            "5086cb9b507219ee95db113a917678b2"
        );
        let mut enc = Cbc::new(Aes::new(&key).unwrap(), &iv, Direction::Encrypt).unwrap();
        let mut out = [0u8; 32];
        enc.process_block(&pt[..16], &mut out[..16]).unwrap();
        enc.process_block(&pt[16..], &mut out[16..]).unwrap();
        assert_eq!(out, ct);

        let mut dec = Cbc::new(Aes::new(&key).unwrap(), &iv, Direction::Decrypt).unwrap();
        let mut back = [0u8; 32];
        dec.process_block(&ct[..16], &mut back[..16]).unwrap();
        dec.process_block(&ct[16..], &mut back[16..]).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn reset_restores_chain() {
        let key = [1u8; 16];
        let iv = [2u8; 16];
        let mut m = Cbc::new(Aes::new(&key).unwrap(), &iv, Direction::Encrypt).unwrap();
        let mut a = [0u8; 16];
        m.process_block(&[3u8; 16], &mut a).unwrap();
        m.reset();
        let mut b = [0u8; 16];
        m.process_block(&[3u8; 16], &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partial_is_refused() {
        let mut m = Cbc::new(Aes::new(&[0u8; 16]).unwrap(), &[0u8; 16], Direction::Encrypt)
            .unwrap();
        let mut out = [0u8; 16];
        assert!(m.process_partial(&[1, 2, 3], &mut out).is_err());
    }
}
