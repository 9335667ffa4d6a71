//! Resumable field decoders.
//!
//! Every decoder in this crate follows the same contract: `consume` pulls as
//! many bytes as it can use from the cursor and reports whether it is done,
//! without blocking and without failing on short input. It may be called any
//! number of times before completion, each time with whatever bytes the
//! transport happened to deliver.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// A decoder that can be suspended after any byte and resumed later.
pub trait PartialDecode {
    /// The decoded value.
    type Output;

    /// Consume bytes from `src` until complete or `src` is exhausted.
    ///
    /// Returns `Ok(true)` once the decoder has everything it needs. Errors are
    /// reserved for malformed input; short input is never an error.
    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool>;

    /// Whether all required bytes have been consumed.
    fn is_complete(&self) -> bool;

    /// The decoded value.
    ///
    /// Fails with [`FrameError::NotReady`] before completion. Field decoders
    /// can be read repeatedly. Frame body decoders move the frame out, so a
    /// second call also fails with `NotReady` even though `is_complete` still
    /// holds; `reset` makes the frame available again.
    fn value(&mut self) -> Result<Self::Output>;

    /// Return to the initial state so the decoder can be reused.
    fn reset(&mut self);
}

/// Big-endian unsigned integer of 1 to 8 bytes.
#[derive(Debug, Clone)]
pub struct IntDecoder {
    width: usize,
    read: usize,
    acc: u64,
}

impl IntDecoder {
    /// Create a decoder for a `width`-byte integer.
    pub fn new(width: usize) -> Result<Self> {
        if !(1..=8).contains(&width) {
            return Err(FrameError::InvalidWidth(width));
        }
        Ok(Self::sized(width))
    }

    const fn sized(width: usize) -> Self {
        Self {
            width,
            read: 0,
            acc: 0,
        }
    }

    /// One byte.
    pub const fn u8() -> Self {
        Self::sized(1)
    }

    /// Two bytes.
    pub const fn u16() -> Self {
        Self::sized(2)
    }

    /// Three bytes (frame lengths).
    pub const fn u24() -> Self {
        Self::sized(3)
    }

    /// Four bytes.
    pub const fn u32() -> Self {
        Self::sized(4)
    }

    /// Six bytes (settings entries).
    pub const fn u48() -> Self {
        Self::sized(6)
    }

    /// Eight bytes.
    pub const fn u64() -> Self {
        Self::sized(8)
    }

    /// Configured width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.read
    }
}

impl PartialDecode for IntDecoder {
    type Output = u64;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        if self.read == 0 && src.remaining() >= self.width {
            self.acc = src.get_uint(self.width);
            self.read = self.width;
            return Ok(true);
        }
        while self.read < self.width && src.has_remaining() {
            self.acc = (self.acc << 8) | u64::from(src.get_u8());
            self.read += 1;
        }
        Ok(self.is_complete())
    }

    fn is_complete(&self) -> bool {
        self.read == self.width
    }

    fn value(&mut self) -> Result<u64> {
        if !self.is_complete() {
            return Err(FrameError::NotReady);
        }
        Ok(self.acc)
    }

    fn reset(&mut self) {
        self.read = 0;
        self.acc = 0;
    }
}

/// Fixed-length run of raw bytes.
///
/// A zero-length decoder is complete from construction. When the whole run is
/// available in the cursor at once it is taken with [`Buf::copy_to_bytes`],
/// which does not copy for `Bytes` and `BytesMut` cursors.
#[derive(Debug, Clone)]
pub struct BytesDecoder {
    len: usize,
    buf: BytesMut,
    ready: Option<Bytes>,
}

impl BytesDecoder {
    /// Create a decoder for exactly `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            buf: BytesMut::new(),
            ready: (len == 0).then(Bytes::new),
        }
    }

    /// Target length.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the target length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        match self.ready {
            Some(_) => self.len,
            None => self.buf.len(),
        }
    }
}

impl PartialDecode for BytesDecoder {
    type Output = Bytes;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        if self.ready.is_some() {
            return Ok(true);
        }
        if self.buf.is_empty() && src.remaining() >= self.len {
            self.ready = Some(src.copy_to_bytes(self.len));
            return Ok(true);
        }

        self.buf.reserve(self.len - self.buf.len());
        while self.buf.len() < self.len && src.has_remaining() {
            let chunk = src.chunk();
            let n = chunk.len().min(self.len - self.buf.len());
            self.buf.extend_from_slice(&chunk[..n]);
            src.advance(n);
        }

        if self.buf.len() == self.len {
            self.ready = Some(self.buf.split().freeze());
        }
        Ok(self.ready.is_some())
    }

    fn is_complete(&self) -> bool {
        self.ready.is_some()
    }

    fn value(&mut self) -> Result<Bytes> {
        self.ready.clone().ok_or(FrameError::NotReady)
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.ready = (self.len == 0).then(Bytes::new);
    }
}

/// Fixed-length run of bytes that are consumed and dropped (padding, excess).
#[derive(Debug, Clone)]
pub struct SkipDecoder {
    len: usize,
    skipped: usize,
}

impl SkipDecoder {
    /// Create a decoder that discards exactly `len` bytes.
    pub fn new(len: usize) -> Self {
        Self { len, skipped: 0 }
    }
}

impl PartialDecode for SkipDecoder {
    type Output = usize;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        let n = src.remaining().min(self.len - self.skipped);
        src.advance(n);
        self.skipped += n;
        Ok(self.is_complete())
    }

    fn is_complete(&self) -> bool {
        self.skipped == self.len
    }

    fn value(&mut self) -> Result<usize> {
        if !self.is_complete() {
            return Err(FrameError::NotReady);
        }
        Ok(self.skipped)
    }

    fn reset(&mut self) {
        self.skipped = 0;
    }
}
