use bytes::Buf;

use super::{prime, primed, require_len, take_frame};
use crate::error::{FrameError, Result};
use crate::frame::{Frame, PriorityFrame, StreamDependency};
use crate::header::FrameHeader;
use crate::partial::{IntDecoder, PartialDecode, SkipDecoder};

const NAME: &str = "PRIORITY";
const FIXED_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StreamDependency,
    Weight,
    Extra,
    Done,
}

/// `E (1) Stream Dependency (31) Weight (8)`. Bytes past the fifth are
/// consumed and dropped.
#[derive(Debug)]
pub struct PriorityDecoder {
    header: FrameHeader,
    state: State,
    dependency: IntDecoder,
    priority: Option<StreamDependency>,
    extra: SkipDecoder,
    frame: Option<Frame>,
}

impl PriorityDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        require_len(&header, FIXED_LEN, NAME)?;
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            state: State::StreamDependency,
            dependency: IntDecoder::u32(),
            priority: None,
            extra: SkipDecoder::new(header.payload_len().saturating_sub(FIXED_LEN)),
            frame: None,
        }
    }
}

impl PartialDecode for PriorityDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::StreamDependency => {
                    if !self.dependency.consume(src)? {
                        return Ok(false);
                    }
                    self.state = State::Weight;
                }
                State::Weight => {
                    if !src.has_remaining() {
                        return Ok(false);
                    }
                    let field = self.dependency.value()? as u32;
                    self.priority = Some(StreamDependency::from_wire(field, src.get_u8()));
                    self.state = State::Extra;
                }
                State::Extra => {
                    if !self.extra.consume(src)? {
                        return Ok(false);
                    }
                    self.frame = Some(Frame::Priority(PriorityFrame {
                        header: self.header,
                        priority: self.priority.ok_or(FrameError::NotReady)?,
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
