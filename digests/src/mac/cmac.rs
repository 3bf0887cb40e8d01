//! CMAC / OMAC1 (RFC 4493) over 64- or 128-bit block ciphers.

use shroud_core::{BlockCipher, CryptoError, Mac, Result};
use zeroize::Zeroize;

/// Constant-time doubling in GF(2^64)/GF(2^128): both the shifted
/// value and the reduced value are computed, the mask selects.
fn dbl(block: &mut [u8], rb: u8) {
    let msb = block[0] >> 7;
    let mask = msb.wrapping_neg();
    let mut carry = 0u8;
    for b in block.iter_mut().rev() {
        let new_carry = *b >> 7;
        *b = (*b << 1) | carry;
        carry = new_carry;
    }
    let last = block.len() - 1;
    block[last] ^= rb & mask;
}

/// CMAC with derived subkeys and a lazily processed final block.
pub struct Cmac<C: BlockCipher> {
    cipher: C,
    k1: Vec<u8>,
    k2: Vec<u8>,
    state: Vec<u8>,
    buffer: Vec<u8>,
    filled: usize,
}

impl<C: BlockCipher> Cmac<C> {
    /// The wrapped cipher must have a 8- or 16-byte block.
    pub fn new(cipher: C) -> Result<Self> {
        let bs = cipher.block_size();
        let rb = match bs {
            8 => 0x1b,
            16 => 0x87,
            _ => return Err(CryptoError::InvalidBlockSize),
        };
        let mut l = vec![0u8; bs];
        cipher.encrypt_block(&mut l)?;
        let mut k1 = l.clone();
        dbl(&mut k1, rb);
        let mut k2 = k1.clone();
        dbl(&mut k2, rb);
        l.zeroize();
        Ok(Cmac {
            cipher,
            k1,
            k2,
            state: vec![0u8; bs],
            buffer: vec![0u8; bs],
            filled: 0,
        })
    }

    fn process_buffer(&mut self) -> Result<()> {
        for i in 0..self.state.len() {
            self.state[i] ^= self.buffer[i];
        }
        self.cipher.encrypt_block(&mut self.state)?;
        self.filled = 0;
        Ok(())
    }
}

impl<C: BlockCipher> Mac for Cmac<C> {
    fn name(&self) -> &'static str {
        "CMAC"
    }

    fn output_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn state_size(&self) -> usize {
        self.cipher.block_size()
    }

    fn update(&mut self, mut data: &[u8]) -> Result<()> {
        let bs = self.state.len();
        while !data.is_empty() {
            // the final block is held back until finalize
            if self.filled == bs {
                self.process_buffer()?;
            }
            let take = (bs - self.filled).min(data.len());
            self.buffer[self.filled..self.filled + take].copy_from_slice(&data[..take]);
            self.filled += take;
            data = &data[take..];
        }
        Ok(())
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let bs = self.state.len();
        if out.len() < bs {
            return Err(CryptoError::ShortBuffer);
        }
        let subkey = if self.filled == bs {
            self.k1.clone()
        } else {
            // ISO 7816-4 pad: 0x80 then zeros
            self.buffer[self.filled] = 0x80;
            for b in &mut self.buffer[self.filled + 1..] {
                *b = 0;
            }
            self.k2.clone()
        };
        for i in 0..bs {
            self.state[i] ^= self.buffer[i] ^ subkey[i];
        }
        self.cipher.encrypt_block(&mut self.state)?;
        out[..bs].copy_from_slice(&self.state);
        self.reset();
        Ok(bs)
    }

    fn reset(&mut self) {
        self.state.zeroize();
        self.buffer.zeroize();
        self.filled = 0;
    }
}

impl<C: BlockCipher> Drop for Cmac<C> {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
        self.state.zeroize();
        self.buffer.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::{Aes, TripleDes};

    fn aes_cmac(msg: &[u8]) -> [u8; 16] {
        let cipher = Aes::new(&hex!("2b7e151628aed2a6abf7158809cf4f3c")).unwrap();
        let mut mac = Cmac::new(cipher).unwrap();
        mac.update(msg).unwrap();
        let mut tag = [0u8; 16];
        mac.finalize_into(&mut tag).unwrap();
        tag
    }

    // RFC 4493 examples 1, 2 and 3.
    #[test]
    fn rfc4493_vectors() {
        assert_eq!(aes_cmac(b""), hex!("bb1d6929e95937287fa37d129b756746"));
        assert_eq!(
            aes_cmac(&hex!("6bc1bee22e409f96e93d7e117393172a")),
            hex!("070a16b46b4d4144f79bdd9dd04a287c")
        );
        assert_eq!(
            aes_cmac(&hex!(
                "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51"
                "30c81c46a35ce411"
            )),
            hex!("dfa66747de9ae63030ca32611497c827")
        );
    }

    #[test]
    fn sixty_four_bit_block_cipher() {
        let cipher =
            TripleDes::new(&hex!("0123456789abcdef23456789abcdef01456789abcdef0123")).unwrap();
        let mut mac = Cmac::new(cipher).unwrap();
        mac.update(b"8 bytes!").unwrap();
        let mut a = [0u8; 8];
        mac.finalize_into(&mut a).unwrap();
        mac.update(b"8 bytes!").unwrap();
        let mut b = [0u8; 8];
        mac.finalize_into(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn chunked_equals_one_shot() {
        let msg: Vec<u8> = (0..100).collect();
        let cipher = Aes::new(&[7u8; 16]).unwrap();
        let mut mac = Cmac::new(cipher).unwrap();
        for c in msg.chunks(13) {
            mac.update(c).unwrap();
        }
        let mut a = [0u8; 16];
        mac.finalize_into(&mut a).unwrap();
        let cipher = Aes::new(&[7u8; 16]).unwrap();
        let mut mac = Cmac::new(cipher).unwrap();
        mac.update(&msg).unwrap();
        let mut b = [0u8; 16];
        mac.finalize_into(&mut b).unwrap();
        assert_eq!(a, b);
    }
}
