//! HMAC (RFC 2104) over any registry digest.

use shroud_core::{CryptoError, Digest, Mac, Result};
use zeroize::Zeroize;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// HMAC with a block-sized stored key.
pub struct Hmac<D: Digest> {
    inner: D,
    key_block: Vec<u8>,
}

impl<D: Digest> Hmac<D> {
    /// Build from a fresh digest instance and a key of any length;
    /// over-long keys are hashed down first.
    pub fn new(mut digest: D, key: &[u8]) -> Result<Self> {
        let block = digest.state_size();
        let mut key_block = vec![0u8; block];
        if key.len() > block {
            digest.update(key)?;
            let n = digest.finalize_into(&mut key_block)?;
            key_block[n..].fill(0);
            digest.reset();
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }
        let mut mac = Hmac {
            inner: digest,
            key_block,
        };
        mac.start_inner()?;
        Ok(mac)
    }

    fn start_inner(&mut self) -> Result<()> {
        let pad: Vec<u8> = self.key_block.iter().map(|b| b ^ IPAD).collect();
        self.inner.update(&pad)
    }
}

impl<D: Digest> Mac for Hmac<D> {
    fn name(&self) -> &'static str {
        "HMAC"
    }

    fn output_size(&self) -> usize {
        self.inner.output_size()
    }

    fn state_size(&self) -> usize {
        self.inner.state_size()
    }

    fn update(&mut self, data: &[u8]) -> Result<()> {
        self.inner.update(data)
    }

    fn finalize_into(&mut self, out: &mut [u8]) -> Result<usize> {
        let n = self.inner.output_size();
        if out.len() < n {
            return Err(CryptoError::ShortBuffer);
        }
        let mut inner_tag = vec![0u8; n];
        self.inner.finalize_into(&mut inner_tag)?;
        self.inner.reset();
        let pad: Vec<u8> = self.key_block.iter().map(|b| b ^ OPAD).collect();
        self.inner.update(&pad)?;
        self.inner.update(&inner_tag)?;
        self.inner.finalize_into(out)?;
        inner_tag.zeroize();
        // back to the keyed ready state
        self.inner.reset();
        self.start_inner()?;
        Ok(n)
    }

    fn reset(&mut self) {
        self.inner.reset();
        // the ipad prefix cannot fail after construction succeeded
        let _ = self.start_inner();
    }
}

impl<D: Digest> Drop for Hmac<D> {
    fn drop(&mut self) {
        self.key_block.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sha256, Sha512};
    use hex_literal::hex;

    // RFC 4231 test case 1.
    #[test]
    fn rfc4231_case1() {
        let mut mac = Hmac::new(Sha256::new(), &[0x0b; 20]).unwrap();
        mac.update(b"Hi There").unwrap();
        let mut tag = [0u8; 32];
        mac.finalize_into(&mut tag).unwrap();
        assert_eq!(
            tag,
            hex!("b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7")
        );
    }

    // RFC 4231 test case 2: short ASCII key.
    #[test]
    fn rfc4231_case2() {
        let mut mac = Hmac::new(Sha256::new(), b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?").unwrap();
        let mut tag = [0u8; 32];
        mac.finalize_into(&mut tag).unwrap();
        assert_eq!(
            tag,
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    // RFC 4231 test case 6: key longer than the block size.
    #[test]
    fn oversized_key_is_hashed() {
        let mut mac = Hmac::new(Sha256::new(), &[0xaa; 131]).unwrap();
        mac.update(b"Test Using Larger Than Block-Size Key - Hash Key First")
            .unwrap();
        let mut tag = [0u8; 32];
        mac.finalize_into(&mut tag).unwrap();
        assert_eq!(
            tag,
            hex!("60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54")
        );
    }

    #[test]
    fn finalize_resets_for_next_message() {
        let mut mac = Hmac::new(Sha512::new(), b"key").unwrap();
        mac.update(b"one").unwrap();
        let mut a = [0u8; 64];
        mac.finalize_into(&mut a).unwrap();
        mac.update(b"one").unwrap();
        let mut b = [0u8; 64];
        mac.finalize_into(&mut b).unwrap();
        assert_eq!(a, b);
    }
}
