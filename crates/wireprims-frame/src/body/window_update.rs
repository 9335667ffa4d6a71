use bytes::Buf;

use super::{prime, primed, require_len, take_frame};
use crate::error::Result;
use crate::frame::{Frame, WindowUpdateFrame};
use crate::header::{FrameHeader, STREAM_ID_MASK};
use crate::partial::{IntDecoder, PartialDecode, SkipDecoder};

const NAME: &str = "WINDOW_UPDATE";
const FIXED_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Increment,
    Extra,
    Done,
}

/// `R (1) Window Size Increment (31)`, excess bytes dropped.
#[derive(Debug)]
pub struct WindowUpdateDecoder {
    header: FrameHeader,
    state: State,
    increment: IntDecoder,
    extra: SkipDecoder,
    frame: Option<Frame>,
}

impl WindowUpdateDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        require_len(&header, FIXED_LEN, NAME)?;
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            state: State::Increment,
            increment: IntDecoder::u32(),
            extra: SkipDecoder::new(header.payload_len().saturating_sub(FIXED_LEN)),
            frame: None,
        }
    }
}

impl PartialDecode for WindowUpdateDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::Increment => {
                    if !self.increment.consume(src)? {
                        return Ok(false);
                    }
                    self.state = State::Extra;
                }
                State::Extra => {
                    if !self.extra.consume(src)? {
                        return Ok(false);
                    }
                    self.frame = Some(Frame::WindowUpdate(WindowUpdateFrame {
                        header: self.header,
                        increment: self.increment.value()? as u32 & STREAM_ID_MASK,
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
