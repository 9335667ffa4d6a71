use std::io::{ErrorKind, Read};
use std::net::TcpStream;

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::codec::FrameConfig;
use crate::decoder::FrameDecoder;
use crate::error::{FrameError, Result};
use crate::frame::Frame;

/// Client connection preface that precedes the first frame on a connection.
pub const CONNECTION_PREFACE: &[u8; 24] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Partial reads are handled internally; callers only ever see complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    decoder: FrameDecoder,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            decoder: FrameDecoder::with_config(&config),
            config,
        }
    }

    /// Consume and check the client connection preface.
    ///
    /// Servers call this once before the first [`read_frame`](Self::read_frame).
    pub fn read_preface(&mut self) -> Result<()> {
        while self.buf.len() < CONNECTION_PREFACE.len() {
            if self.fill()? == 0 {
                return Err(FrameError::ConnectionClosed);
            }
        }
        if &self.buf[..CONNECTION_PREFACE.len()] != CONNECTION_PREFACE {
            return Err(FrameError::InvalidPreface);
        }
        self.buf.advance(CONNECTION_PREFACE.len());
        debug!("accepted connection preface");
        Ok(())
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.decoder.decode(&mut self.buf)? {
                return Ok(frame);
            }

            if self.fill()? == 0 {
                if self.decoder.is_idle() {
                    debug!("peer closed connection on a frame boundary");
                } else {
                    debug!("peer closed connection mid-frame");
                }
                return Err(FrameError::ConnectionClosed);
            }
        }
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum frame size for subsequent frame decoding.
    pub fn set_max_frame_size(&mut self, max_frame_size: u32) {
        self.config.max_frame_size = max_frame_size;
        self.decoder.set_max_frame_size(max_frame_size);
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<TcpStream> {
    /// Create a frame reader for a `TcpStream` and apply read timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
