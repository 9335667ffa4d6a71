use bytes::Buf;

use super::{prime, primed, require_len, take_frame};
use crate::error::Result;
use crate::frame::{ErrorCode, Frame, RstStreamFrame};
use crate::header::FrameHeader;
use crate::partial::{IntDecoder, PartialDecode, SkipDecoder};

const NAME: &str = "RST_STREAM";
const FIXED_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ErrorCode,
    Extra,
    Done,
}

/// `Error Code (32)`, excess bytes dropped.
#[derive(Debug)]
pub struct RstStreamDecoder {
    header: FrameHeader,
    state: State,
    error_code: IntDecoder,
    extra: SkipDecoder,
    frame: Option<Frame>,
}

impl RstStreamDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        require_len(&header, FIXED_LEN, NAME)?;
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            state: State::ErrorCode,
            error_code: IntDecoder::u32(),
            extra: SkipDecoder::new(header.payload_len().saturating_sub(FIXED_LEN)),
            frame: None,
        }
    }
}

impl PartialDecode for RstStreamDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::ErrorCode => {
                    if !self.error_code.consume(src)? {
                        return Ok(false);
                    }
                    self.state = State::Extra;
                }
                State::Extra => {
                    if !self.extra.consume(src)? {
                        return Ok(false);
                    }
                    self.frame = Some(Frame::RstStream(RstStreamFrame {
                        header: self.header,
                        error_code: ErrorCode(self.error_code.value()? as u32),
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
