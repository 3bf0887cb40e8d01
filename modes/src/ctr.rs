//! Counter mode. The low half of the block increments as a
//! big-endian integer; partial final blocks are fine.

use shroud_core::{BlockCipher, BlockModeCore, CryptoError, Result};
use zeroize::Zeroize;

/// CTR over any block cipher. Encrypt and decrypt are the same
/// transform.
pub struct Ctr<C: BlockCipher> {
    cipher: C,
    iv: Vec<u8>,
    counter: Vec<u8>,
    scratch: Vec<u8>,
}

impl<C: BlockCipher> Ctr<C> {
    /// The IV must be exactly one block; its low half is the counter
    /// start.
    pub fn new(cipher: C, iv: &[u8]) -> Result<Self> {
        if iv.len() != cipher.block_size() {
            return Err(CryptoError::InvalidIvSize);
        }
        Ok(Ctr {
            counter: iv.to_vec(),
            scratch: vec![0; iv.len()],
            iv: iv.to_vec(),
            cipher,
        })
    }

    fn keystream(&mut self) -> Result<()> {
        self.scratch.copy_from_slice(&self.counter);
        self.cipher.encrypt_block(&mut self.scratch)?;
        // big-endian increment of the low half
        let bs = self.counter.len();
        for i in (bs / 2..bs).rev() {
            self.counter[i] = self.counter[i].wrapping_add(1);
            if self.counter[i] != 0 {
                break;
            }
        }
        Ok(())
    }
}

impl<C: BlockCipher> BlockModeCore for Ctr<C> {
    fn name(&self) -> &'static str {
        "CTR"
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
        self.keystream()?;
        for i in 0..bs {
            output[i] = input[i] ^ self.scratch[i];
        }
        Ok(bs)
    }

    fn process_partial(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.cipher.block_size();
        if input.len() > bs {
            return Err(CryptoError::ShortBuffer);
        }
        if output.len() < input.len() {
            return Err(CryptoError::ShortBuffer);
        }
        self.keystream()?;
        for i in 0..input.len() {
            output[i] = input[i] ^ self.scratch[i];
        }
        Ok(input.len())
    }

    fn reset(&mut self) {
        self.counter.copy_from_slice(&self.iv);
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for Ctr<C> {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.iv.zeroize();
        self.scratch.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use shroud_block_ciphers::Aes;

    // NIST SP 800-38A F.5.1.
    #[test]
    fn sp800_38a_ctr_aes128() {
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt = hex!(
            "6bc1bee22e409f96e93d7e117393172a"
            "ae2d8a571e03ac9c9eb76fac45af8e51"
        );
        let ct = hex!(
            "874d6191b620e3261bef6864990db6ce"
            "9806f66b7970fdff8617187bb9fffdff"
        );
        let mut m = Ctr::new(Aes::new(&key).unwrap(), &iv).unwrap();
        let mut out = [0u8; 32];
        m.process_block(&pt[..16], &mut out[..16]).unwrap();
        m.process_block(&pt[16..], &mut out[16..]).unwrap();
        assert_eq!(out, ct);
        // decrypt is the same transform
        m.reset();
        let mut back = [0u8; 32];
        m.process_block(&ct[..16], &mut back[..16]).unwrap();
        m.process_block(&ct[16..], &mut back[16..]).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn xor_property() {
        // CTR(P) xor CTR(Q) == P xor Q under the same key and IV
        let key = [9u8; 16];
        let iv = [1u8; 16];
        let p = [0x33u8; 48];
        let q = [0xc3u8; 48];
        let run = |data: &[u8]| {
            let mut m = Ctr::new(Aes::new(&key).unwrap(), &iv).unwrap();
            let mut out = vec![0u8; data.len()];
            for (i, chunk) in data.chunks(16).enumerate() {
                m.process_block(chunk, &mut out[16 * i..16 * i + 16]).unwrap();
            }
            out
        };
        let cp = run(&p);
        let cq = run(&q);
        for i in 0..p.len() {
            assert_eq!(cp[i] ^ cq[i], p[i] ^ q[i]);
        }
    }

    #[test]
    fn partial_tail() {
        let key = [7u8; 16];
        let iv = [0u8; 16];
        let mut m = Ctr::new(Aes::new(&key).unwrap(), &iv).unwrap();
        let mut out = [0u8; 5];
        assert_eq!(m.process_partial(b"tiny!", &mut out).unwrap(), 5);
        // matches the prefix of a full block
        let mut m2 = Ctr::new(Aes::new(&key).unwrap(), &iv).unwrap();
        let mut full_in = [0u8; 16];
        full_in[..5].copy_from_slice(b"tiny!");
        let mut full = [0u8; 16];
        m2.process_block(&full_in, &mut full).unwrap();
        assert_eq!(out, full[..5]);
    }
}
