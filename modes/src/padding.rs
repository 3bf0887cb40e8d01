//! Block paddings. Validation on removal runs over the whole block
//! whatever is found, and every failure is the same `CorruptPadding`.

use rand_core::RngCore;
use shroud_core::{CryptoError, Padding, Result};

fn check_add(block: &[u8], filled: usize) -> Result<usize> {
    if filled >= block.len() {
        return Err(CryptoError::ArgumentInvalid("block already full"));
    }
    Ok(block.len() - filled)
}

/// PKCS#7: `k` bytes of value `k`.
pub struct Pkcs7;

impl Padding for Pkcs7 {
    fn name(&self) -> &'static str {
        "PKCS7"
    }

    fn add_padding(&mut self, block: &mut [u8], filled: usize) -> Result<usize> {
        let k = check_add(block, filled)?;
        for b in &mut block[filled..] {
            *b = k as u8;
        }
        Ok(k)
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize> {
        let k = block[block.len() - 1] as usize;
        let mut bad = u8::from(k == 0 || k > block.len());
        // visit every byte; only the last k-1 may differ
        for (i, &b) in block.iter().enumerate() {
            let in_pad = i + k >= block.len();
            bad |= u8::from(in_pad && b as usize != k && i != block.len() - 1);
        }
        if bad != 0 {
            return Err(CryptoError::CorruptPadding);
        }
        Ok(k)
    }
}

/// ISO/IEC 7816-4: one `0x80` marker then zeros.
pub struct Iso7816;

impl Padding for Iso7816 {
    fn name(&self) -> &'static str {
        "ISO7816D4"
    }

    fn add_padding(&mut self, block: &mut [u8], filled: usize) -> Result<usize> {
        let k = check_add(block, filled)?;
        block[filled] = 0x80;
        for b in &mut block[filled + 1..] {
            *b = 0;
        }
        Ok(k)
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize> {
        let mut marker = 0usize;
        let mut seen = 0u8;
        let mut bad = 0u8;
        for (i, &b) in block.iter().enumerate().rev() {
            let is_marker = u8::from(b == 0x80) & (1 - seen);
            marker |= (block.len() - i) * is_marker as usize;
            seen |= is_marker;
            bad |= u8::from(b != 0) & (1 - seen);
        }
        if bad | (1 - seen) != 0 {
            return Err(CryptoError::CorruptPadding);
        }
        Ok(marker)
    }
}

/// ISO 10126-2: random fill then a final count byte.
pub struct Iso10126 {
    rng: Box<dyn RngCore + Send>,
}

impl Iso10126 {
    /// The entropy source is injected; the library holds no global
    /// RNG.
    pub fn new(rng: Box<dyn RngCore + Send>) -> Self {
        Iso10126 { rng }
    }
}

impl Padding for Iso10126 {
    fn name(&self) -> &'static str {
        "ISO10126D2"
    }

    fn add_padding(&mut self, block: &mut [u8], filled: usize) -> Result<usize> {
        let k = check_add(block, filled)?;
        self.rng.fill_bytes(&mut block[filled..]);
        let last = block.len() - 1;
        block[last] = k as u8;
        Ok(k)
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize> {
        let k = block[block.len() - 1] as usize;
        if k == 0 || k > block.len() {
            return Err(CryptoError::CorruptPadding);
        }
        Ok(k)
    }
}

/// Trailing-bit-complement: the final plaintext bit, inverted,
/// repeated through the block.
pub struct Tbc;

impl Padding for Tbc {
    fn name(&self) -> &'static str {
        "TBC"
    }

    fn add_padding(&mut self, block: &mut [u8], filled: usize) -> Result<usize> {
        let k = check_add(block, filled)?;
        let last_bit = if filled > 0 {
            block[filled - 1] & 1
        } else {
            // an all-padding block complements the last bit of the
            // previous block, which the caller no longer has; the
            // original system pads with 0xFF in that case
            0
        };
        let fill = if last_bit == 0 { 0xff } else { 0x00 };
        for b in &mut block[filled..] {
            *b = fill;
        }
        Ok(k)
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize> {
        let fill = block[block.len() - 1];
        if fill != 0x00 && fill != 0xff {
            return Err(CryptoError::CorruptPadding);
        }
        let mut count = 0usize;
        let mut still = 1u8;
        for &b in block.iter().rev() {
            still &= u8::from(b == fill);
            count += still as usize;
        }
        if count == 0 || count > block.len() {
            return Err(CryptoError::CorruptPadding);
        }
        Ok(count)
    }
}

/// ANSI X9.23: zero fill then a final count byte.
pub struct X923;

impl Padding for X923 {
    fn name(&self) -> &'static str {
        "X923"
    }

    fn add_padding(&mut self, block: &mut [u8], filled: usize) -> Result<usize> {
        let k = check_add(block, filled)?;
        for b in &mut block[filled..] {
            *b = 0;
        }
        let last = block.len() - 1;
        block[last] = k as u8;
        Ok(k)
    }

    fn pad_count(&self, block: &[u8]) -> Result<usize> {
        let k = block[block.len() - 1] as usize;
        let mut bad = u8::from(k == 0 || k > block.len());
        for (i, &b) in block.iter().enumerate() {
            let in_zero_run = i + k >= block.len() && i != block.len() - 1;
            bad |= u8::from(in_zero_run && b != 0);
        }
        if bad != 0 {
            return Err(CryptoError::CorruptPadding);
        }
        Ok(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pkcs7_round_trip() {
        let mut p = Pkcs7;
        let mut block = [0u8; 16];
        block[..5].copy_from_slice(b"hello");
        assert_eq!(p.add_padding(&mut block, 5).unwrap(), 11);
        assert_eq!(block[15], 11);
        assert_eq!(p.pad_count(&block).unwrap(), 11);
    }

    #[test]
    fn pkcs7_rejects_corruption_uniformly() {
        let p = Pkcs7;
        let mut block = [4u8; 8];
        block[3] = 9; // inside the claimed pad run
        assert_eq!(p.pad_count(&block), Err(CryptoError::CorruptPadding));
        let block = [0u8; 8];
        assert_eq!(p.pad_count(&block), Err(CryptoError::CorruptPadding));
        let mut block = [0u8; 8];
        block[7] = 9; // longer than the block
        assert_eq!(p.pad_count(&block), Err(CryptoError::CorruptPadding));
    }

    #[test]
    fn iso7816_marker_scan() {
        let mut p = Iso7816;
        let mut block = [0u8; 8];
        block[..3].copy_from_slice(b"abc");
        assert_eq!(p.add_padding(&mut block, 3).unwrap(), 5);
        assert_eq!(block[3], 0x80);
        assert_eq!(p.pad_count(&block).unwrap(), 5);
        // no marker at all
        assert_eq!(p.pad_count(&[0u8; 8]), Err(CryptoError::CorruptPadding));
        // stray byte after the marker
        let mut bad = [0u8; 8];
        bad[2] = 0x80;
        bad[5] = 1;
        assert_eq!(p.pad_count(&bad), Err(CryptoError::CorruptPadding));
    }

    #[test]
    fn iso10126_random_fill_keeps_count() {
        let mut p = Iso10126::new(Box::new(StdRng::seed_from_u64(7)));
        let mut block = [0u8; 16];
        block[..2].copy_from_slice(b"xy");
        assert_eq!(p.add_padding(&mut block, 2).unwrap(), 14);
        assert_eq!(block[15], 14);
        assert_eq!(p.pad_count(&block).unwrap(), 14);
    }

    #[test]
    fn tbc_complements_last_bit() {
        let mut p = Tbc;
        let mut block = [0u8; 8];
        block[..2].copy_from_slice(&[0x01, 0x02]); // last bit 0 -> fill 0xff
        p.add_padding(&mut block, 2).unwrap();
        assert!(block[2..].iter().all(|&b| b == 0xff));
        assert_eq!(p.pad_count(&block).unwrap(), 6);

        let mut block = [0u8; 8];
        block[..2].copy_from_slice(&[0x01, 0x01]); // last bit 1 -> fill 0x00
        p.add_padding(&mut block, 2).unwrap();
        assert!(block[2..].iter().all(|&b| b == 0x00));
        assert_eq!(p.pad_count(&block).unwrap(), 6);
    }

    #[test]
    fn x923_zero_run() {
        let mut p = X923;
        let mut block = [0xaau8; 8];
        p.add_padding(&mut block, 3).unwrap();
        assert_eq!(&block[3..], &[0, 0, 0, 0, 5]);
        assert_eq!(p.pad_count(&block).unwrap(), 5);
        let mut bad = block;
        bad[4] = 1;
        assert_eq!(p.pad_count(&bad), Err(CryptoError::CorruptPadding));
    }
}
