//! Output Feedback; partial final blocks are fine, encrypt and
//! decrypt are the same transform.

use shroud_core::{BlockCipher, BlockModeCore, CryptoError, Result};
use zeroize::Zeroize;

/// OFB over any block cipher.
pub struct Ofb<C: BlockCipher> {
    cipher: C,
    iv: Vec<u8>,
    z: Vec<u8>,
}

impl<C: BlockCipher> Ofb<C> {
    /// The IV must be exactly one block.
    pub fn new(cipher: C, iv: &[u8]) -> Result<Self> {
        if iv.len() != cipher.block_size() {
            return Err(CryptoError::InvalidIvSize);
        }
        Ok(Ofb {
            z: iv.to_vec(),
            iv: iv.to_vec(),
            cipher,
        })
    }

    fn transform(&mut self, input: &[u8], output: &mut [u8], n: usize) -> Result<usize> {
        self.cipher.encrypt_block(&mut self.z)?;
        for i in 0..n {
            output[i] = input[i] ^ self.z[i];
        }
        Ok(n)
    }
}

impl<C: BlockCipher> BlockModeCore for Ofb<C> {
    fn name(&self) -> &'static str {
        "OFB"
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
        self.z.copy_from_slice(&self.iv);
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for Ofb<C> {
    fn drop(&mut self) {
        self.z.zeroize();
        self.iv.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::Aes;

    // NIST SP 800-38A F.4.1.
    #[test]
    fn sp800_38a_ofb_aes128() {
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex!("000102030405060708090a0b0c0d0e0f");
        let pt = hex!(
            "6bc1bee22e409f96e93d7e117393172a"
            "ae2d8a571e03ac9c9eb76fac45af8e51"
        );
        let ct = hex!(
            "3b3fd92eb72dad20333449f8e83cfb4a"
            "7789508d16918f03f53c52dac54ed825"
        );
        let mut m = Ofb::new(Aes::new(&key).unwrap(), &iv).unwrap();
        let mut out = [0u8; 32];
        m.process_block(&pt[..16], &mut out[..16]).unwrap();
        m.process_block(&pt[16..], &mut out[16..]).unwrap();
        assert_eq!(out, ct);
        m.reset();
        let mut back = [0u8; 32];
        m.process_block(&ct[..16], &mut back[..16]).unwrap();
        m.process_block(&ct[16..], &mut back[16..]).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn length_preserved_on_partial() {
        let mut m = Ofb::new(Aes::new(&[1u8; 16]).unwrap(), &[2u8; 16]).unwrap();
        let mut out = [0u8; 3];
        assert_eq!(m.process_partial(b"odd", &mut out).unwrap(), 3);
    }
}
