use bytes::Buf;

use super::{prime, primed, take_frame};
use crate::error::Result;
use crate::frame::{Frame, PingFrame};
use crate::header::FrameHeader;
use crate::partial::{IntDecoder, PartialDecode, SkipDecoder};

const OPAQUE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OpaqueData,
    Extra,
    Done,
}

/// `Opaque Data (64)`.
///
/// The opaque data is always eight bytes, whatever the header declares; the
/// declared length only decides how many trailing bytes to drop after it.
#[derive(Debug)]
pub struct PingDecoder {
    header: FrameHeader,
    state: State,
    opaque: IntDecoder,
    extra: SkipDecoder,
    frame: Option<Frame>,
}

impl PingDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            state: State::OpaqueData,
            opaque: IntDecoder::u64(),
            extra: SkipDecoder::new(header.payload_len().saturating_sub(OPAQUE_LEN)),
            frame: None,
        }
    }
}

impl PartialDecode for PingDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::OpaqueData => {
                    if !self.opaque.consume(src)? {
                        return Ok(false);
                    }
                    self.state = State::Extra;
                }
                State::Extra => {
                    if !self.extra.consume(src)? {
                        return Ok(false);
                    }
                    self.frame = Some(Frame::Ping(PingFrame {
                        header: self.header,
                        opaque_data: self.opaque.value()?.to_be_bytes(),
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
