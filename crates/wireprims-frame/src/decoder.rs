use bytes::Buf;
use tracing::{trace, warn};

use crate::body::BodyDecoder;
use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::header::{HeaderDecoder, MAX_FRAME_LENGTH};
use crate::partial::PartialDecode;

#[derive(Debug)]
enum State {
    AwaitingHeader,
    AwaitingBody(BodyDecoder),
}

/// Connection-level frame decoder.
///
/// Feed it whatever bytes the transport produced; it returns a frame as soon
/// as one is complete and otherwise keeps its place until the next call. One
/// decoder serves exactly one connection.
///
/// ```
/// use wireprims_frame::{Frame, FrameDecoder};
///
/// let mut decoder = FrameDecoder::new();
/// let wire = [0, 0, 0, 0x4, 0x1, 0, 0, 0, 0]; // SETTINGS ACK
///
/// let mut first: &[u8] = &wire[..4];
/// assert!(decoder.decode(&mut first).unwrap().is_none());
///
/// let mut rest: &[u8] = &wire[4..];
/// let frame = decoder.decode(&mut rest).unwrap().unwrap();
/// assert!(matches!(frame, Frame::Settings(f) if f.is_ack()));
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    header: HeaderDecoder,
    max_frame_size: u32,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            state: State::AwaitingHeader,
            header: HeaderDecoder::new(),
            max_frame_size: config.max_frame_size.min(MAX_FRAME_LENGTH),
        }
    }

    /// Update the largest payload length accepted for subsequent frames.
    pub fn set_max_frame_size(&mut self, max_frame_size: u32) {
        self.max_frame_size = max_frame_size.min(MAX_FRAME_LENGTH);
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    /// Decode the next frame from `src`.
    ///
    /// Returns `Ok(None)` once `src` is exhausted without completing a frame;
    /// the partial state is kept for the next call. Bytes after a completed
    /// frame are left in `src`.
    ///
    /// On error the in-flight state is discarded. The stream position is lost
    /// at that point, so the connection should be dropped.
    pub fn decode<B: Buf>(&mut self, src: &mut B) -> Result<Option<Frame>> {
        match self.step(src) {
            Err(err) => {
                if err.is_protocol_error() {
                    warn!(error = %err, "rejecting frame");
                }
                self.reset();
                Err(err)
            }
            ok => ok,
        }
    }

    /// Decode every frame that can be completed from `src`.
    pub fn decode_all<B: Buf>(&mut self, src: &mut B) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.decode(src)? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// True when the decoder sits on a frame boundary with nothing buffered.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::AwaitingHeader) && self.header.is_idle()
    }

    /// Drop any partially decoded frame.
    pub fn reset(&mut self) {
        self.state = State::AwaitingHeader;
        self.header.reset();
    }

    fn step<B: Buf>(&mut self, src: &mut B) -> Result<Option<Frame>> {
        loop {
            match &mut self.state {
                State::AwaitingHeader => {
                    if !self.header.consume(src)? {
                        return Ok(None);
                    }
                    let header = self.header.value()?;
                    self.header.reset();
                    trace!(
                        frame_type = %header.kind(),
                        flags = header.flags,
                        stream_id = header.stream_id,
                        length = header.length,
                        "decoded frame header"
                    );

                    if header.length > self.max_frame_size {
                        return Err(FrameError::FrameTooLarge {
                            size: header.length,
                            max: self.max_frame_size,
                        });
                    }
                    self.state = State::AwaitingBody(BodyDecoder::for_header(header)?);
                }
                State::AwaitingBody(body) => {
                    if !body.consume(src)? {
                        return Ok(None);
                    }
                    let frame = body.value()?;
                    self.state = State::AwaitingHeader;
                    trace!(
                        frame_type = %frame.frame_type(),
                        stream_id = frame.stream_id(),
                        "decoded frame"
                    );
                    return Ok(Some(frame));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::frame::{flags, FrameType};
    use crate::header::HEADER_SIZE;

    fn wire(frame_type: u8, flags: u8, stream_id: u32, payload: &[u8]) -> BytesMut {
        let mut buf = BytesMut::new();
        buf.put_uint(payload.len() as u64, 3);
        buf.put_u8(frame_type);
        buf.put_u8(flags);
        buf.put_u32(stream_id);
        buf.put_slice(payload);
        buf
    }

    #[test]
    fn header_and_body_in_one_call() {
        let mut decoder = FrameDecoder::new();
        let mut src = wire(0x0, flags::END_STREAM, 1, b"body");

        let frame = decoder.decode(&mut src).unwrap().unwrap();
        assert_eq!(frame.frame_type(), FrameType::Data);
        assert_eq!(frame.payload().unwrap().as_ref(), b"body");
        assert!(src.is_empty());
        assert!(decoder.is_idle());
    }

    #[test]
    fn suspends_mid_header_and_mid_body() {
        let mut decoder = FrameDecoder::new();
        let all = wire(0x8, 0, 3, &[0, 0, 0x10, 0]);

        let mut part: &[u8] = &all[..5];
        assert!(decoder.decode(&mut part).unwrap().is_none());
        assert!(!decoder.is_idle());

        let mut part: &[u8] = &all[5..HEADER_SIZE + 2];
        assert!(decoder.decode(&mut part).unwrap().is_none());

        let mut part: &[u8] = &all[HEADER_SIZE + 2..];
        let frame = decoder.decode(&mut part).unwrap().unwrap();
        assert!(matches!(frame, Frame::WindowUpdate(f) if f.increment == 0x1000));
    }

    #[test]
    fn leaves_following_frame_in_cursor() {
        let mut decoder = FrameDecoder::new();
        let mut src = wire(0x6, 0, 0, &[0; 8]);
        src.extend_from_slice(&wire(0x4, flags::ACK, 0, &[]));

        let first = decoder.decode(&mut src).unwrap().unwrap();
        assert_eq!(first.frame_type(), FrameType::Ping);
        assert_eq!(src.len(), HEADER_SIZE);

        let second = decoder.decode(&mut src).unwrap().unwrap();
        assert_eq!(second.frame_type(), FrameType::Settings);
        assert!(decoder.decode(&mut src).unwrap().is_none());
    }

    #[test]
    fn decode_all_collects_frames() {
        let mut decoder = FrameDecoder::new();
        let mut src = wire(0x9, 0, 1, b"a");
        src.extend_from_slice(&wire(0x9, flags::END_HEADERS, 1, b"b"));
        src.extend_from_slice(&wire(0x0, 0, 1, b"partial")[..6]);

        let frames = decoder.decode_all(&mut src).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(src.is_empty());
        assert!(!decoder.is_idle());
    }

    #[test]
    fn oversized_frame_rejected() {
        let config = FrameConfig {
            max_frame_size: 4,
            ..FrameConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(&config);
        let mut src = wire(0x0, 0, 1, b"too long");

        let err = decoder.decode(&mut src).unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 8, max: 4 }));
        assert!(decoder.is_idle());
    }

    #[test]
    fn malformed_frame_resets_state() {
        let mut decoder = FrameDecoder::new();
        let mut src = wire(0x4, 0, 0, &[0; 5]);

        let err = decoder.decode(&mut src).unwrap_err();
        assert!(matches!(err, FrameError::Malformed { .. }));
        assert!(decoder.is_idle());
    }

    #[test]
    fn max_frame_size_clamped_to_length_field() {
        let mut decoder = FrameDecoder::new();
        decoder.set_max_frame_size(u32::MAX);
        assert_eq!(decoder.max_frame_size(), MAX_FRAME_LENGTH);
    }
}
