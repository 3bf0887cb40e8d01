//! Constant-time and endian byte helpers.
//!
//! The XOR and wipe routines never early-exit on content, and the
//! equality check visits every byte whatever the outcome; timing is a
//! function of length only.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// `out[..n] = a[..n] ^ b[..n]`.
///
/// Fails `ShortBuffer` if any slice is shorter than `n`; no partial
/// write happens on failure.
pub fn xor(a: &[u8], b: &[u8], out: &mut [u8], n: usize) -> Result<()> {
    if a.len() < n || b.len() < n || out.len() < n {
        return Err(CryptoError::ShortBuffer);
    }
    for i in 0..n {
        out[i] = a[i] ^ b[i];
    }
    Ok(())
}

/// `a[..n] ^= b[..n]`.
pub fn xor_in_place(a: &mut [u8], b: &[u8], n: usize) -> Result<()> {
    if a.len() < n || b.len() < n {
        return Err(CryptoError::ShortBuffer);
    }
    for i in 0..n {
        a[i] ^= b[i];
    }
    Ok(())
}

/// Constant-time slice equality.
///
/// ORs all byte differences into one accumulator and reduces once;
/// unequal lengths compare unequal without inspecting content.
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Zero a buffer so the optimizer cannot elide the writes.
pub fn secure_wipe(buf: &mut [u8]) {
    buf.zeroize();
}

/// Read a big-endian `u32` at `off`.
#[inline]
pub fn load_u32_be(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes(buf[off..off + 4].try_into().unwrap())
}

/// Read a little-endian `u32` at `off`.
#[inline]
pub fn load_u32_le(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes(buf[off..off + 4].try_into().unwrap())
}

/// Read a big-endian `u64` at `off`.
#[inline]
pub fn load_u64_be(buf: &[u8], off: usize) -> u64 {
    u64::from_be_bytes(buf[off..off + 8].try_into().unwrap())
}

/// Read a little-endian `u64` at `off`.
#[inline]
pub fn load_u64_le(buf: &[u8], off: usize) -> u64 {
    u64::from_le_bytes(buf[off..off + 8].try_into().unwrap())
}

/// Write a big-endian `u32` at `off`.
#[inline]
pub fn store_u32_be(v: u32, buf: &mut [u8], off: usize) {
    buf[off..off + 4].copy_from_slice(&v.to_be_bytes());
}

/// Write a little-endian `u32` at `off`.
#[inline]
pub fn store_u32_le(v: u32, buf: &mut [u8], off: usize) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

/// Write a big-endian `u64` at `off`.
#[inline]
pub fn store_u64_be(v: u64, buf: &mut [u8], off: usize) {
    buf[off..off + 8].copy_from_slice(&v.to_be_bytes());
}

/// Write a little-endian `u64` at `off`.
#[inline]
pub fn store_u64_le(v: u64, buf: &mut [u8], off: usize) {
    buf[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

/// Rotate left; distance is taken modulo the word width.
#[inline]
pub fn rotl32(v: u32, n: u32) -> u32 {
    v.rotate_left(n)
}

/// Rotate right; distance is taken modulo the word width.
#[inline]
pub fn rotr32(v: u32, n: u32) -> u32 {
    v.rotate_right(n)
}

/// Rotate left; distance is taken modulo the word width.
#[inline]
pub fn rotl64(v: u64, n: u32) -> u64 {
    v.rotate_left(n)
}

/// Rotate right; distance is taken modulo the word width.
#[inline]
pub fn rotr64(v: u64, n: u32) -> u64 {
    v.rotate_right(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_basics() {
        let a = [0xffu8, 0x00, 0xaa, 0x55];
        let b = [0x0fu8, 0xf0, 0xaa, 0xff];
        let mut out = [0u8; 4];
        xor(&a, &b, &mut out, 4).unwrap();
        assert_eq!(out, [0xf0, 0xf0, 0x00, 0xaa]);
        assert_eq!(xor(&a, &b, &mut out, 5), Err(CryptoError::ShortBuffer));
    }

    #[test]
    fn xor_in_place_matches_xor() {
        let mut a = [1u8, 2, 3, 4];
        let b = [4u8, 3, 2, 1];
        xor_in_place(&mut a, &b, 4).unwrap();
        assert_eq!(a, [5, 1, 1, 5]);
    }

    #[test]
    fn ct_equal() {
        assert!(constant_time_equal(b"same bytes", b"same bytes"));
        assert!(!constant_time_equal(b"same bytes", b"same byteZ"));
        assert!(!constant_time_equal(b"short", b"longer"));
        assert!(constant_time_equal(b"", b""));
    }

    #[test]
    fn wipe_zeroes_everything() {
        let mut buf = vec![0xa5u8; 257];
        secure_wipe(&mut buf);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn endian_round_trips() {
        let mut buf = [0u8; 12];
        store_u32_be(0x0123_4567, &mut buf, 1);
        assert_eq!(load_u32_be(&buf, 1), 0x0123_4567);
        assert_eq!(&buf[1..5], &[0x01, 0x23, 0x45, 0x67]);
        store_u64_le(0x0123_4567_89ab_cdef, &mut buf, 4);
        assert_eq!(load_u64_le(&buf, 4), 0x0123_4567_89ab_cdef);
        assert_eq!(buf[4], 0xef);
    }

    #[test]
    fn rotates_mod_width() {
        assert_eq!(rotl32(0x8000_0001, 1), 0x0000_0003);
        assert_eq!(rotl32(1, 33), 2);
        assert_eq!(rotr64(1, 65), 0x8000_0000_0000_0000);
    }
}
