use bytes::Buf;

use super::{prime, primed, require_len, take_frame};
use crate::error::Result;
use crate::frame::{ErrorCode, Frame, GoAwayFrame};
use crate::header::{FrameHeader, STREAM_ID_MASK};
use crate::partial::{BytesDecoder, IntDecoder, PartialDecode};

const NAME: &str = "GOAWAY";
const FIXED_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LastStreamId,
    ErrorCode,
    DebugData,
    Done,
}

/// `R (1) Last-Stream-ID (31) Error Code (32) Additional Debug Data (*)`
#[derive(Debug)]
pub struct GoAwayDecoder {
    header: FrameHeader,
    state: State,
    last_stream_id: u32,
    int: IntDecoder,
    debug_data: BytesDecoder,
    frame: Option<Frame>,
}

impl GoAwayDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        require_len(&header, FIXED_LEN, NAME)?;
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            state: State::LastStreamId,
            last_stream_id: 0,
            int: IntDecoder::u32(),
            debug_data: BytesDecoder::new(header.payload_len().saturating_sub(FIXED_LEN)),
            frame: None,
        }
    }
}

impl PartialDecode for GoAwayDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::LastStreamId => {
                    if !self.int.consume(src)? {
                        return Ok(false);
                    }
                    self.last_stream_id = self.int.value()? as u32 & STREAM_ID_MASK;
                    self.int.reset();
                    self.state = State::ErrorCode;
                }
                State::ErrorCode => {
                    if !self.int.consume(src)? {
                        return Ok(false);
                    }
                    self.state = State::DebugData;
                }
                State::DebugData => {
                    if !self.debug_data.consume(src)? {
                        return Ok(false);
                    }
                    self.frame = Some(Frame::GoAway(GoAwayFrame {
                        header: self.header,
                        last_stream_id: self.last_stream_id,
                        error_code: ErrorCode(self.int.value()? as u32),
                        debug_data: self.debug_data.value()?,
                    }));
                    self.state = State::Done;
                }
                State::Done => return Ok(true),
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    fn value(&mut self) -> Result<Frame> {
        take_frame(&mut self.frame)
    }

    fn reset(&mut self) {
        *self = Self::initial(self.header);
        // The header passed validation in `new`; an empty cursor cannot fail.
        let _ = prime(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::test_support::decode_all_ways;
    use crate::error::FrameError;

    fn goaway(frame: Frame) -> GoAwayFrame {
        match frame {
            Frame::GoAway(f) => f,
            other => panic!("expected GOAWAY, got {other:?}"),
        }
    }

    #[test]
    fn last_stream_id_is_masked() {
        let header = FrameHeader::new(8, 0x7, 0, 0);
        let payload = [0xFF, 0xFF, 0xFF, 0xFE, 0x00, 0x00, 0x00, 0x02];
        let frame = goaway(decode_all_ways(header, &payload));

        assert_eq!(frame.last_stream_id, 0x7FFF_FFFE);
        assert_eq!(frame.error_code, ErrorCode(2));
        assert!(frame.debug_data.is_empty());
    }

    #[test]
    fn debug_data_is_kept() {
        let header = FrameHeader::new(13, 0x7, 0, 0);
        let mut payload = vec![0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x0B];
        payload.extend_from_slice(b"calm!");
        let frame = goaway(decode_all_ways(header, &payload));

        assert_eq!(frame.last_stream_id, 9);
        assert_eq!(frame.error_code.name(), Some("ENHANCE_YOUR_CALM"));
        assert_eq!(frame.debug_data.as_ref(), b"calm!");
    }

    #[test]
    fn short_length_is_malformed() {
        let err = GoAwayDecoder::new(FrameHeader::new(7, 0x7, 0, 0)).unwrap_err();
        assert!(matches!(err, FrameError::Malformed { frame_type: "GOAWAY", .. }));
    }
}
