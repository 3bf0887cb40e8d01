//! Encrypting/decrypting stream decorators.
//!
//! `CryptoWriter` transforms everything written through it before it
//! reaches the inner writer; `CryptoReader` transforms everything
//! read from the inner reader. Both own their transform and buffers,
//! pre-allocated at construction; non-AEAD steady state allocates
//! nothing. All buffers and the transform state are wiped on drop.

use std::io::{Read, Write};

use tracing::{debug, trace};
use zeroize::Zeroize;

use shroud_core::{CipherWrapper, CryptoError, Direction};

use crate::ring::RingBuffer;

/// Ring capacity multiplier on the write (encrypt) side.
const WRITE_RING_SHIFT: usize = 8;
/// Ring capacity multiplier on the read (decrypt) side.
const READ_RING_SHIFT: usize = 2;

/// A writer that pushes every byte through a cipher pipeline.
pub struct CryptoWriter<W: Write> {
    inner: Option<W>,
    wrapper: Box<dyn CipherWrapper + Send>,
    direction: Direction,
    op_buffer: Vec<u8>,
    op_off: usize,
    temp: Vec<u8>,
    ring: RingBuffer,
    bytes_in: u64,
    bytes_out: u64,
    withheld: u64,
    finished: bool,
}

impl<W: Write> CryptoWriter<W> {
    /// Wrap `inner`; all bytes written are transformed in
    /// `direction` before being forwarded.
    pub fn new(inner: W, wrapper: Box<dyn CipherWrapper + Send>, direction: Direction) -> Self {
        let op = wrapper.operation_size();
        CryptoWriter {
            inner: Some(inner),
            direction,
            op_buffer: vec![0; op],
            op_off: 0,
            temp: vec![0; 2 * op],
            ring: RingBuffer::with_capacity(op << WRITE_RING_SHIFT),
            wrapper,
            bytes_in: 0,
            bytes_out: 0,
            withheld: 0,
            finished: false,
        }
    }

    /// Bytes accepted from the caller so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Bytes pushed to the inner writer so far.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Decrypting through a block mode with padding must hold the
    /// last full block back for `process_final`.
    fn holds_full_buffer(&self) -> bool {
        self.direction == Direction::Decrypt && !self.wrapper.is_partial_block_ok()
    }

    fn flush_op_buffer(&mut self) -> std::io::Result<()> {
        let n = {
            let (op_buffer, temp) = (&self.op_buffer, &mut self.temp);
            self.wrapper
                .process_bytes(op_buffer, temp)
                .map_err(std::io::Error::from)?
        };
        self.withheld += self.op_buffer.len() as u64;
        self.withheld -= n as u64;
        self.ring.put(&self.temp[..n]).map_err(std::io::Error::from)?;
        self.op_off = 0;
        Ok(())
    }

    fn drain_ring(&mut self, leave: usize) -> std::io::Result<()> {
        let op = self.wrapper.operation_size();
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| std::io::Error::from(CryptoError::InvalidState))?;
        while self.ring.len() > leave {
            let n = (self.ring.len() - leave).min(op);
            self.ring.take_to_stream(inner, n)?;
            self.bytes_out += n as u64;
        }
        Ok(())
    }

    fn write_inner(&mut self, mut data: &[u8]) -> std::io::Result<()> {
        if self.finished {
            return Err(CryptoError::InvalidState.into());
        }
        let op = self.wrapper.operation_size();
        self.bytes_in += data.len() as u64;
        while !data.is_empty() {
            if self.op_off == op {
                // full buffer and more bytes on the way
                self.flush_op_buffer()?;
            }
            let take = (op - self.op_off).min(data.len());
            self.op_buffer[self.op_off..self.op_off + take].copy_from_slice(&data[..take]);
            self.op_off += take;
            data = &data[take..];
            if self.op_off == op && !self.holds_full_buffer() {
                self.flush_op_buffer()?;
            }
            // keep headroom so long writes cannot overflow the queue
            if self.ring.spare() < 2 * op {
                self.drain_ring(op)?;
            }
        }
        Ok(())
    }

    /// Run `process_final` over whatever is buffered, push the tail
    /// (padding, tag or remaining plaintext) to the inner writer and
    /// return it.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.finalize()?;
        match self.inner.take() {
            Some(mut w) => {
                w.flush()?;
                Ok(w)
            }
            None => Err(CryptoError::InvalidState.into()),
        }
    }

    fn finalize(&mut self) -> std::io::Result<()> {
        if self.finished {
            return Err(CryptoError::InvalidState.into());
        }
        debug!(bytes_in = self.bytes_in, "finalizing crypto writer");
        self.drain_ring(0)?;
        // AEAD decryption releases everything it withheld here
        let bound = self.op_off + self.withheld as usize + self.wrapper.operation_size() + 64;
        let mut final_buf = vec![0u8; bound.max(self.temp.len())];
        let n = self
            .wrapper
            .process_final(&self.op_buffer[..self.op_off], &mut final_buf)
            .map_err(|e| {
                self.wipe();
                std::io::Error::from(e)
            })?;
        match self.inner.as_mut() {
            Some(w) => w.write_all(&final_buf[..n])?,
            None => return Err(CryptoError::InvalidState.into()),
        }
        self.bytes_out += n as u64;
        final_buf.zeroize();
        self.op_off = 0;
        self.finished = true;
        self.wipe();
        Ok(())
    }

    fn wipe(&mut self) {
        self.op_buffer.zeroize();
        self.temp.zeroize();
        self.ring.erase();
    }
}

impl<W: Write> Write for CryptoWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_inner(buf)?;
        // opportunistically drain, keeping one operation queued
        let leave = self.wrapper.operation_size();
        self.drain_ring(leave)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.drain_ring(0)?;
        match self.inner.as_mut() {
            Some(w) => w.flush(),
            None => Err(CryptoError::InvalidState.into()),
        }
    }
}

impl<W: Write> Drop for CryptoWriter<W> {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// A reader that pulls from the inner reader and transforms
/// everything it hands out. End of the inner stream triggers
/// finalization (padding or tag handling).
pub struct CryptoReader<R: Read> {
    inner: Option<R>,
    wrapper: Box<dyn CipherWrapper + Send>,
    /// A full operation withheld until the next read proves it is not
    /// the stream's last.
    held: Vec<u8>,
    held_full: bool,
    temp: Vec<u8>,
    ring: RingBuffer,
    /// Output of `process_final`, served after the ring.
    pending: Vec<u8>,
    pending_off: usize,
    bytes_in: u64,
    bytes_out: u64,
    withheld: u64,
    finished: bool,
}

impl<R: Read> CryptoReader<R> {
    /// Wrap `inner`; all bytes read are transformed in `direction`.
    pub fn new(inner: R, wrapper: Box<dyn CipherWrapper + Send>, _direction: Direction) -> Self {
        let op = wrapper.operation_size();
        CryptoReader {
            inner: Some(inner),
            held: vec![0; op],
            held_full: false,
            temp: vec![0; 2 * op],
            ring: RingBuffer::with_capacity(op << READ_RING_SHIFT),
            wrapper,
            pending: Vec::new(),
            pending_off: 0,
            bytes_in: 0,
            bytes_out: 0,
            withheld: 0,
            finished: false,
        }
    }

    /// Bytes consumed from the inner reader.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Bytes handed to the caller.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Give back the inner reader once the stream is exhausted.
    pub fn into_inner(mut self) -> Option<R> {
        self.wipe();
        self.inner.take()
    }

    fn buffered(&self) -> usize {
        self.ring.len() + (self.pending.len() - self.pending_off)
    }

    /// Read up to `want` bytes from the inner stream, looping over
    /// short reads.
    fn fill_from_inner(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let inner = self
            .inner
            .as_mut()
            .ok_or_else(|| std::io::Error::from(CryptoError::InvalidState))?;
        let mut got = 0;
        while got < buf.len() {
            let n = inner.read(&mut buf[got..])?;
            if n == 0 {
                break;
            }
            got += n;
        }
        self.bytes_in += got as u64;
        Ok(got)
    }

    /// Pull one operation through the pipeline, or finalize on EOF.
    fn pump(&mut self) -> std::io::Result<()> {
        let op = self.wrapper.operation_size();
        let mut chunk = vec![0u8; op];
        let got = self.fill_from_inner(&mut chunk)?;
        if got == op {
            if self.held_full {
                let n = {
                    let (held, temp) = (&self.held, &mut self.temp);
                    self.wrapper.process_bytes(held, temp)?
                };
                self.withheld += op as u64;
                self.withheld -= n as u64;
                self.ring.put(&self.temp[..n]).map_err(std::io::Error::from)?;
            }
            self.held.copy_from_slice(&chunk);
            self.held_full = true;
            chunk.zeroize();
            return Ok(());
        }
        // EOF on the inner stream: whatever we hold is the final input
        trace!(got, "inner stream exhausted, finalizing");
        let mut final_input = Vec::with_capacity(op + got);
        if self.held_full {
            if got > 0 {
                // trailing bytes followed, so the held operation was
                // ordinary data
                let n = {
                    let (held, temp) = (&self.held, &mut self.temp);
                    self.wrapper.process_bytes(held, temp)?
                };
                self.withheld += op as u64;
                self.withheld -= n as u64;
                self.ring.put(&self.temp[..n]).map_err(std::io::Error::from)?;
            } else {
                final_input.extend_from_slice(&self.held);
            }
        }
        final_input.extend_from_slice(&chunk[..got]);
        chunk.zeroize();
        let bound = final_input.len() + self.withheld as usize + op + 64;
        let mut out = vec![0u8; bound];
        let n = self
            .wrapper
            .process_final(&final_input, &mut out)
            .map_err(|e| {
                self.wipe();
                std::io::Error::from(e)
            })?;
        out.truncate(n);
        final_input.zeroize();
        self.pending = out;
        self.pending_off = 0;
        self.held_full = false;
        self.finished = true;
        debug!(bytes_in = self.bytes_in, "crypto reader finalized");
        Ok(())
    }

    fn wipe(&mut self) {
        self.held.zeroize();
        self.temp.zeroize();
        self.pending.zeroize();
        self.ring.erase();
    }
}

impl<R: Read> Read for CryptoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.buffered() == 0 {
            if self.finished {
                return Ok(0);
            }
            self.pump()?;
        }
        let mut served = 0;
        // ring first, then the finalization tail
        let from_ring = self.ring.len().min(buf.len());
        if from_ring > 0 {
            self.ring
                .take(&mut buf[..from_ring])
                .map_err(std::io::Error::from)?;
            served += from_ring;
        }
        if served < buf.len() && self.pending_off < self.pending.len() {
            let n = (self.pending.len() - self.pending_off).min(buf.len() - served);
            buf[served..served + n]
                .copy_from_slice(&self.pending[self.pending_off..self.pending_off + n]);
            self.pending_off += n;
            served += n;
        }
        self.bytes_out += served as u64;
        Ok(served)
    }
}

impl<R: Read> Drop for CryptoReader<R> {
    fn drop(&mut self) {
        self.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_cipher_wrapper, CipherConfiguration};

    fn aes_cbc_cfg() -> CipherConfiguration {
        CipherConfiguration::block("AES", "CBC", Some("PKCS7"), 128, &[3u8; 16])
    }

    fn wrapper(cfg: &CipherConfiguration, d: Direction) -> Box<dyn CipherWrapper + Send> {
        build_cipher_wrapper(cfg, &[9u8; 16], d).unwrap()
    }

    #[test]
    fn writer_then_reader_round_trip() {
        let cfg = aes_cbc_cfg();
        let pt: Vec<u8> = (0..200u8).collect();
        let mut w = CryptoWriter::new(
            Vec::new(),
            wrapper(&cfg, Direction::Encrypt),
            Direction::Encrypt,
        );
        for chunk in pt.chunks(7) {
            w.write_all(chunk).unwrap();
        }
        let ct = w.finish().unwrap();
        assert_eq!(ct.len(), (200 / 16 + 1) * 16);

        let mut r = CryptoReader::new(
            ct.as_slice(),
            wrapper(&cfg, Direction::Decrypt),
            Direction::Decrypt,
        );
        let mut back = Vec::new();
        r.read_to_end(&mut back).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn decrypting_writer_strips_padding() {
        let cfg = aes_cbc_cfg();
        let pt = b"fourteen bytes".to_vec();
        let mut w = CryptoWriter::new(
            Vec::new(),
            wrapper(&cfg, Direction::Encrypt),
            Direction::Encrypt,
        );
        w.write_all(&pt).unwrap();
        let ct = w.finish().unwrap();

        let mut dw = CryptoWriter::new(
            Vec::new(),
            wrapper(&cfg, Direction::Decrypt),
            Direction::Decrypt,
        );
        for b in &ct {
            dw.write_all(std::slice::from_ref(b)).unwrap();
        }
        let back = dw.finish().unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn empty_plaintext_still_emits_padding_block() {
        let cfg = aes_cbc_cfg();
        let w = CryptoWriter::new(
            Vec::new(),
            wrapper(&cfg, Direction::Encrypt),
            Direction::Encrypt,
        );
        let ct = w.finish().unwrap();
        assert_eq!(ct.len(), 16);
    }

    #[test]
    fn write_after_finish_is_rejected() {
        let cfg = aes_cbc_cfg();
        let mut w = CryptoWriter::new(
            Vec::new(),
            wrapper(&cfg, Direction::Encrypt),
            Direction::Encrypt,
        );
        w.finalize().unwrap();
        assert!(w.write_all(b"late").is_err());
    }
}
