//! Power-of-two circular byte buffer backing the output side of the
//! crypto streams.

use std::io::Write;

use shroud_core::{CryptoError, Result};
use zeroize::Zeroize;

/// Fixed-capacity FIFO. Head/tail wrap with a mask; bulk operations
/// split into at most two contiguous copies.
pub struct RingBuffer {
    storage: Vec<u8>,
    head: usize,
    tail: usize,
    len: usize,
}

impl RingBuffer {
    /// `capacity` is rounded up to the next power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.max(2).next_power_of_two();
        RingBuffer {
            storage: vec![0; cap],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Bytes currently queued.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining space.
    pub fn spare(&self) -> usize {
        self.storage.len() - self.len
    }

    #[inline]
    fn mask(&self) -> usize {
        self.storage.len() - 1
    }

    /// Queue `src`; fails `Overflow` without writing anything if it
    /// does not fit.
    pub fn put(&mut self, src: &[u8]) -> Result<()> {
        if src.len() > self.spare() {
            return Err(CryptoError::Overflow);
        }
        let cap = self.storage.len();
        let first = src.len().min(cap - self.tail);
        self.storage[self.tail..self.tail + first].copy_from_slice(&src[..first]);
        if first < src.len() {
            self.storage[..src.len() - first].copy_from_slice(&src[first..]);
        }
        self.tail = (self.tail + src.len()) & self.mask();
        self.len += src.len();
        Ok(())
    }

    /// Dequeue exactly `dst.len()` bytes; fails `Underflow` without
    /// consuming anything if fewer are queued.
    pub fn take(&mut self, dst: &mut [u8]) -> Result<()> {
        if dst.len() > self.len {
            return Err(CryptoError::Underflow);
        }
        let cap = self.storage.len();
        let first = dst.len().min(cap - self.head);
        dst[..first].copy_from_slice(&self.storage[self.head..self.head + first]);
        if first < dst.len() {
            let rem = dst.len() - first;
            dst[first..].copy_from_slice(&self.storage[..rem]);
        }
        self.head = (self.head + dst.len()) & self.mask();
        self.len -= dst.len();
        Ok(())
    }

    /// Move `n` bytes from the head into a writer, preserving
    /// wrap-around as at most two writes.
    pub fn take_to_stream<W: Write>(&mut self, dst: &mut W, n: usize) -> std::io::Result<()> {
        if n > self.len {
            return Err(CryptoError::Underflow.into());
        }
        let cap = self.storage.len();
        let first = n.min(cap - self.head);
        dst.write_all(&self.storage[self.head..self.head + first])?;
        if first < n {
            dst.write_all(&self.storage[..n - first])?;
        }
        self.head = (self.head + n) & self.mask();
        self.len -= n;
        Ok(())
    }

    /// Zeroize the storage and reset the indices.
    pub fn erase(&mut self) {
        self.storage.zeroize();
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

impl Drop for RingBuffer {
    fn drop(&mut self) {
        self.storage.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_up() {
        let r = RingBuffer::with_capacity(1000);
        assert_eq!(r.spare(), 1024);
    }

    #[test]
    fn fifo_order_with_wraparound() {
        let mut r = RingBuffer::with_capacity(8);
        r.put(&[1, 2, 3, 4, 5, 6]).unwrap();
        let mut out = [0u8; 4];
        r.take(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        // tail wraps past the end here
        r.put(&[7, 8, 9, 10, 11]).unwrap();
        let mut rest = [0u8; 7];
        r.take(&mut rest).unwrap();
        assert_eq!(rest, [5, 6, 7, 8, 9, 10, 11]);
        assert!(r.is_empty());
    }

    #[test]
    fn overflow_and_underflow_are_reported() {
        let mut r = RingBuffer::with_capacity(4);
        assert_eq!(r.put(&[0u8; 5]), Err(CryptoError::Overflow));
        r.put(&[1, 2]).unwrap();
        let mut out = [0u8; 3];
        assert_eq!(r.take(&mut out), Err(CryptoError::Underflow));
        // failed operations leave state untouched
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn take_to_stream_splits_wrapped_ranges() {
        let mut r = RingBuffer::with_capacity(8);
        r.put(&[0u8; 6]).unwrap();
        let mut sink = Vec::new();
        r.take_to_stream(&mut sink, 6).unwrap();
        r.put(&[9u8; 7]).unwrap();
        sink.clear();
        r.take_to_stream(&mut sink, 7).unwrap();
        assert_eq!(sink, vec![9u8; 7]);
    }

    #[test]
    fn erase_zeroizes() {
        let mut r = RingBuffer::with_capacity(8);
        r.put(&[0xffu8; 8]).unwrap();
        r.erase();
        assert!(r.is_empty());
        assert_eq!(r.spare(), 8);
    }
}
